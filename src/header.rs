//! パートヘッダーブロックのパース
//!
//! 境界直後から空行までのヘッダー行リストを、パート記述子のメタデータ
//! ([`PartHeaders`]) に変換します。受信した行そのもの (終端 CRLF を除いた
//! バイト列) は順序・大文字小文字を保ったまま保持し、再シリアライズ時の
//! 正本とします。

use crate::content_disposition::ContentDisposition;
use crate::error::Error;
use core::fmt;

/// Content-Transfer-Encoding (RFC 2045)
///
/// パーサーはデコードを行わず、値を識別して保持するだけ。ボディバイトは
/// そのまま通過する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTransferEncoding {
    /// 7bit
    SevenBit,
    /// 8bit
    EightBit,
    /// binary
    Binary,
    /// quoted-printable
    QuotedPrintable,
    /// base64
    Base64,
}

impl ContentTransferEncoding {
    /// ヘッダー値をパース (大文字小文字を区別しない)
    pub fn parse(value: &str) -> Result<Self, Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "7bit" => Ok(ContentTransferEncoding::SevenBit),
            "8bit" => Ok(ContentTransferEncoding::EightBit),
            "binary" => Ok(ContentTransferEncoding::Binary),
            "quoted-printable" => Ok(ContentTransferEncoding::QuotedPrintable),
            "base64" => Ok(ContentTransferEncoding::Base64),
            _ => Err(Error::InvalidContentTransferEncoding(
                value.trim().to_string(),
            )),
        }
    }

    /// ヘッダー値としての表記を取得
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentTransferEncoding::SevenBit => "7bit",
            ContentTransferEncoding::EightBit => "8bit",
            ContentTransferEncoding::Binary => "binary",
            ContentTransferEncoding::QuotedPrintable => "quoted-printable",
            ContentTransferEncoding::Base64 => "base64",
        }
    }
}

impl fmt::Display for ContentTransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// パートのヘッダーブロック (パート記述子のメタデータ)
///
/// `header_lines` が存在する間はそれがシリアライズの正本となる。固定
/// フィールドを変更すると `header_lines` は破棄され、以後は固定フィールド
/// から行が再生成される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartHeaders {
    /// Content-Disposition の name (必須、非空)
    name: String,
    /// Content-Disposition の filename
    filename: Option<String>,
    /// Content-Type の値 (前後の空白を除いてそのまま)
    content_type: Option<String>,
    /// Content-Length の値 (検証せずそのまま通過)
    content_length: Option<String>,
    /// Content-Transfer-Encoding
    content_transfer_encoding: Option<ContentTransferEncoding>,
    /// 受信したままのヘッダー行 (終端 CRLF を除くバイト列)
    header_lines: Vec<Vec<u8>>,
    /// 上記以外のヘッダー (小文字化した名前と値)
    extra_headers: Vec<(String, String)>,
}

impl PartHeaders {
    /// 新しいヘッダーブロックを作成
    pub fn new(name: &str) -> Self {
        PartHeaders {
            name: name.to_string(),
            filename: None,
            content_type: None,
            content_length: None,
            content_transfer_encoding: None,
            header_lines: Vec::new(),
            extra_headers: Vec::new(),
        }
    }

    /// 受信したヘッダー行リストからパース
    ///
    /// 各行は `name: value` 形式でなければならず、Content-Disposition は
    /// 必須。既知ヘッダー以外は名前を小文字化して `extra_headers` に入り、
    /// 元の行は `header_lines` にバイト列のまま残る。
    pub fn from_lines(lines: Vec<Vec<u8>>) -> Result<Self, Error> {
        let mut disposition = None;
        let mut content_type = None;
        let mut content_length = None;
        let mut content_transfer_encoding = None;
        let mut extra_headers = Vec::new();

        for line in &lines {
            let colon = line.iter().position(|&b| b == b':').ok_or_else(|| {
                Error::InvalidHeaderLine(format!(
                    "missing colon in {:?}",
                    String::from_utf8_lossy(line)
                ))
            })?;
            let key = std::str::from_utf8(&line[..colon])
                .map_err(|_| Error::InvalidHeaderLine("non UTF-8 header name".to_string()))?
                .trim()
                .to_ascii_lowercase();
            let value = &line[colon + 1..];

            match key.as_str() {
                "content-disposition" => {
                    let value = std::str::from_utf8(value).map_err(|_| {
                        Error::InvalidHeaderLine(
                            "non UTF-8 Content-Disposition value".to_string(),
                        )
                    })?;
                    disposition = Some(ContentDisposition::parse(value)?);
                }
                "content-type" => {
                    content_type = Some(String::from_utf8_lossy(value).trim().to_string());
                }
                "content-length" => {
                    content_length = Some(String::from_utf8_lossy(value).trim().to_string());
                }
                "content-transfer-encoding" => {
                    let value = String::from_utf8_lossy(value);
                    content_transfer_encoding = Some(ContentTransferEncoding::parse(&value)?);
                }
                _ => {
                    extra_headers.push((key, String::from_utf8_lossy(value).trim().to_string()));
                }
            }
        }

        let disposition = disposition.ok_or(Error::MissingContentDisposition)?;
        Ok(PartHeaders {
            name: disposition.name().to_string(),
            filename: disposition.filename().map(str::to_string),
            content_type,
            content_length,
            content_transfer_encoding,
            header_lines: lines,
            extra_headers,
        })
    }

    /// name を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    /// filename を取得
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Content-Type を取得
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Content-Length を取得
    pub fn content_length(&self) -> Option<&str> {
        self.content_length.as_deref()
    }

    /// Content-Transfer-Encoding を取得
    pub fn content_transfer_encoding(&self) -> Option<ContentTransferEncoding> {
        self.content_transfer_encoding
    }

    /// 受信したままのヘッダー行を取得 (再生成された場合は空)
    pub fn header_lines(&self) -> &[Vec<u8>] {
        &self.header_lines
    }

    /// その他のヘッダーを取得
    pub fn extra_headers(&self) -> &[(String, String)] {
        &self.extra_headers
    }

    /// その他のヘッダーを名前で取得 (大文字小文字を区別しない)
    pub fn extra_header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.extra_headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// ファイルパートかどうか
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }

    /// filename を設定 (ビルダー)
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.set_filename(Some(filename));
        self
    }

    /// Content-Type を設定 (ビルダー)
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.set_content_type(Some(content_type));
        self
    }

    /// Content-Transfer-Encoding を設定 (ビルダー)
    pub fn with_content_transfer_encoding(mut self, encoding: ContentTransferEncoding) -> Self {
        self.content_transfer_encoding = Some(encoding);
        self.header_lines.clear();
        self
    }

    /// その他のヘッダーを追加 (ビルダー)
    pub fn with_extra_header(mut self, name: &str, value: &str) -> Self {
        self.extra_headers
            .push((name.to_ascii_lowercase(), value.to_string()));
        self.header_lines.clear();
        self
    }

    /// name を変更
    ///
    /// 固定フィールドの変更は保持していた受信行を無効化する。
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.header_lines.clear();
    }

    /// filename を変更
    pub fn set_filename(&mut self, filename: Option<&str>) {
        self.filename = filename.map(str::to_string);
        self.header_lines.clear();
    }

    /// Content-Type を変更
    pub fn set_content_type(&mut self, content_type: Option<&str>) {
        self.content_type = content_type.map(str::to_string);
        self.header_lines.clear();
    }

    /// Content-Length を変更
    pub fn set_content_length(&mut self, content_length: Option<&str>) {
        self.content_length = content_length.map(str::to_string);
        self.header_lines.clear();
    }
}

//! multipart ストリームのシリアライズ
//!
//! ## 概要
//!
//! パートのヘッダー行生成と境界フレーミングを提供します。パース時に
//! 保持された受信行 ([`PartHeaders::header_lines`]) があればそれを正本
//! として書き出し、なければ (変換で固定フィールドが書き換えられた場合
//! など) 固定フィールドから行を再生成します。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_multipart::{MultipartBuilder, MultipartParser};
//!
//! let body = MultipartBuilder::with_boundary("boundary")
//!     .text_field("field1", "value1")
//!     .build();
//!
//! let parts = MultipartParser::parse("boundary", &body).unwrap();
//! assert_eq!(parts[0].name(), "field1");
//! assert_eq!(parts[0].body(), b"value1");
//! ```

use crate::bytes::{CRLF, DOUBLE_DASH};
use crate::content_disposition::ContentDisposition;
use crate::header::PartHeaders;
use crate::part::Part;

/// パート記述子からヘッダー行を再生成
///
/// Content-Disposition、Content-Type、Content-Transfer-Encoding、その他の
/// ヘッダー、Content-Length の順。引用符内の `"` と `\` はバックスラッシュ
/// でエスケープされる。
pub fn build_header_lines(headers: &PartHeaders) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();

    let mut disposition = ContentDisposition::new(headers.name());
    if let Some(filename) = headers.filename() {
        disposition = disposition.with_filename(filename);
    }
    lines.push(format!("Content-Disposition: {}", disposition).into_bytes());

    if let Some(content_type) = headers.content_type() {
        lines.push(format!("Content-Type: {}", content_type).into_bytes());
    }
    if let Some(encoding) = headers.content_transfer_encoding() {
        lines.push(format!("Content-Transfer-Encoding: {}", encoding).into_bytes());
    }
    for (name, value) in headers.extra_headers() {
        lines.push(format!("{}: {}", name, value).into_bytes());
    }
    if let Some(content_length) = headers.content_length() {
        lines.push(format!("Content-Length: {}", content_length).into_bytes());
    }

    lines
}

/// 境界区切りの multipart ストリームを逐次書き出すシリアライザ
///
/// `part_head` と生のボディバイトを交互に書き、最後に `close` を書く。
/// 最初のデリミタの前には CRLF を置かず、2 つ目以降のデリミタと閉じ
/// デリミタの前には置く (RFC 2046 のデリミタはパート末尾の CRLF を含む)。
#[derive(Debug, Clone)]
pub struct MultipartSerializer {
    /// 出力境界
    boundary: String,
    /// まだパートを書き出していないか
    first: bool,
}

impl MultipartSerializer {
    /// 新しいシリアライザを作成
    pub fn new(boundary: &str) -> Self {
        MultipartSerializer {
            boundary: boundary.to_string(),
            first: true,
        }
    }

    /// 出力境界を取得
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// パートのデリミタとヘッダーブロックをエンコード
    ///
    /// 戻り値の後に呼び出し側がボディバイトをそのまま続ける。
    pub fn part_head(&mut self, headers: &PartHeaders) -> Vec<u8> {
        let mut out = Vec::new();
        if self.first {
            self.first = false;
        } else {
            out.extend_from_slice(CRLF);
        }
        out.extend_from_slice(DOUBLE_DASH);
        out.extend_from_slice(self.boundary.as_bytes());
        out.extend_from_slice(CRLF);

        if headers.header_lines().is_empty() {
            for line in build_header_lines(headers) {
                out.extend_from_slice(&line);
                out.extend_from_slice(CRLF);
            }
        } else {
            for line in headers.header_lines() {
                out.extend_from_slice(line);
                out.extend_from_slice(CRLF);
            }
        }
        out.extend_from_slice(CRLF);
        out
    }

    /// 閉じデリミタをエンコード
    pub fn close(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(CRLF);
        out.extend_from_slice(DOUBLE_DASH);
        out.extend_from_slice(self.boundary.as_bytes());
        out.extend_from_slice(DOUBLE_DASH);
        out
    }
}

/// multipart ボディビルダー
///
/// フィールドを追加するたびにシリアライザへ逐次エンコードし、`build` で
/// 閉じデリミタを付けて完成させる。パートのリストは保持しない。
#[derive(Debug, Clone)]
pub struct MultipartBuilder {
    /// フレーミングを担うシリアライザ
    serializer: MultipartSerializer,
    /// エンコード済みのペイロード先頭部分
    encoded: Vec<u8>,
}

impl MultipartBuilder {
    /// 乱数値から境界を生成して作成
    ///
    /// Sans I/O の設計上、乱数は呼び出し側が用意する。同じ値からは常に
    /// 同じ境界が得られる。
    ///
    /// # 例
    ///
    /// ```
    /// use shiguredo_multipart::MultipartBuilder;
    ///
    /// let builder = MultipartBuilder::new(0x517e_c0de);
    /// assert!(builder.boundary().starts_with("----MultipartBoundary"));
    /// ```
    pub fn new(random_value: u64) -> Self {
        Self::with_boundary(&format!("----MultipartBoundary{:016x}", random_value))
    }

    /// 境界を指定して作成
    pub fn with_boundary(boundary: &str) -> Self {
        MultipartBuilder {
            serializer: MultipartSerializer::new(boundary),
            encoded: Vec::new(),
        }
    }

    /// 境界文字列を取得
    pub fn boundary(&self) -> &str {
        self.serializer.boundary()
    }

    /// Content-Type ヘッダー値を取得
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary())
    }

    /// テキストフィールドを追加
    pub fn text_field(self, name: &str, value: &str) -> Self {
        self.append(&PartHeaders::new(name), value.as_bytes())
    }

    /// ファイルフィールドを追加
    pub fn file_field(self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        let headers = PartHeaders::new(name)
            .with_filename(filename)
            .with_content_type(content_type);
        self.append(&headers, data)
    }

    /// パートを追加
    pub fn part(self, part: Part) -> Self {
        self.append(part.headers(), part.body())
    }

    /// ヘッダーブロックとボディを書き込む
    fn append(mut self, headers: &PartHeaders, body: &[u8]) -> Self {
        let head = self.serializer.part_head(headers);
        self.encoded.extend_from_slice(&head);
        self.encoded.extend_from_slice(body);
        self
    }

    /// 閉じデリミタまで書いてボディを完成させる
    pub fn build(mut self) -> Vec<u8> {
        let close = self.serializer.close();
        self.encoded.extend_from_slice(&close);
        self.encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::ContentTransferEncoding;
    use crate::parser::MultipartParser;

    #[test]
    fn test_builder_framing() {
        let body = MultipartBuilder::with_boundary("boundary")
            .text_field("field1", "value1")
            .build();

        let expected = b"--boundary\r\n\
            Content-Disposition: form-data; name=\"field1\"\r\n\r\n\
            value1\r\n\
            --boundary--";
        assert_eq!(body, expected);
    }

    #[test]
    fn test_builder_two_parts_framing() {
        let body = MultipartBuilder::with_boundary("b")
            .text_field("a", "1")
            .text_field("b", "2")
            .build();

        let expected = b"--b\r\n\
            Content-Disposition: form-data; name=\"a\"\r\n\r\n\
            1\r\n\
            --b\r\n\
            Content-Disposition: form-data; name=\"b\"\r\n\r\n\
            2\r\n\
            --b--";
        assert_eq!(body, expected);
    }

    #[test]
    fn test_builder_empty_is_close_delimiter_only() {
        let body = MultipartBuilder::with_boundary("b").build();
        assert_eq!(body, b"\r\n--b--");

        let parts = MultipartParser::parse("b", &body).unwrap();
        assert!(parts.is_empty());
    }

    #[test]
    fn test_builder_with_file() {
        let body = MultipartBuilder::with_boundary("boundary")
            .file_field("file", "test.txt", "text/plain", b"content")
            .build();

        let body_str = String::from_utf8_lossy(&body);
        assert!(body_str
            .contains("Content-Disposition: form-data; name=\"file\"; filename=\"test.txt\""));
        assert!(body_str.contains("Content-Type: text/plain"));
        assert!(body_str.contains("content"));
    }

    #[test]
    fn test_build_header_lines_order_and_escaping() {
        let mut headers = PartHeaders::new("fi\"eld")
            .with_filename("back\\slash.txt")
            .with_content_type("text/plain")
            .with_content_transfer_encoding(ContentTransferEncoding::Base64)
            .with_extra_header("X-Custom", "custom-value");
        headers.set_content_length(Some("7"));

        let lines = build_header_lines(&headers);
        assert_eq!(
            lines,
            vec![
                br#"Content-Disposition: form-data; name="fi\"eld"; filename="back\\slash.txt""#
                    .to_vec(),
                b"Content-Type: text/plain".to_vec(),
                b"Content-Transfer-Encoding: base64".to_vec(),
                b"x-custom: custom-value".to_vec(),
                b"Content-Length: 7".to_vec(),
            ]
        );
    }

    #[test]
    fn test_received_lines_are_authoritative() {
        // パース時の行がそのまま再シリアライズされる (名前の大文字小文字も保持)
        let payload = b"--b\r\n\
            CONTENT-DISPOSITION: form-data; name=\"a\"\r\n\
            X-Weird-Header:   spaced value\r\n\r\n\
            body\r\n\
            --b--";
        let parts = MultipartParser::parse("b", payload).unwrap();

        let mut serializer = MultipartSerializer::new("b");
        let head = serializer.part_head(parts[0].headers());
        let head_str = String::from_utf8_lossy(&head);
        assert!(head_str.contains("CONTENT-DISPOSITION: form-data; name=\"a\"\r\n"));
        assert!(head_str.contains("X-Weird-Header:   spaced value\r\n"));
    }

    #[test]
    fn test_mutated_fields_win_over_received_lines() {
        let payload = b"--b\r\n\
            Content-Disposition: form-data; name=\"old\"\r\n\r\n\
            body\r\n\
            --b--";
        let mut parts = MultipartParser::parse("b", payload).unwrap();
        parts[0].headers_mut().set_name("new");

        let mut serializer = MultipartSerializer::new("b");
        let head = serializer.part_head(parts[0].headers());
        let head_str = String::from_utf8_lossy(&head);
        assert!(head_str.contains("form-data; name=\"new\""));
        assert!(!head_str.contains("old"));
    }

    #[test]
    fn test_roundtrip() {
        let original = MultipartBuilder::with_boundary("test-boundary")
            .text_field("name", "John")
            .text_field("age", "30")
            .file_field("photo", "photo.jpg", "image/jpeg", b"\xFF\xD8\xFF\xE0")
            .build();

        let parts = MultipartParser::parse("test-boundary", &original).unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].name(), "name");
        assert_eq!(parts[0].body(), b"John");
        assert_eq!(parts[2].filename(), Some("photo.jpg"));
        assert_eq!(parts[2].body(), b"\xFF\xD8\xFF\xE0");

        // 再シリアライズして再パースしても同じ記述子列になる
        let rebuilt = {
            let mut builder = MultipartBuilder::with_boundary("test-boundary");
            for part in &parts {
                builder = builder.part(part.clone());
            }
            builder.build()
        };
        let reparsed = MultipartParser::parse("test-boundary", &rebuilt).unwrap();
        assert_eq!(reparsed, parts);
    }

    #[test]
    fn test_boundary_rekeying() {
        let original = MultipartBuilder::with_boundary("first")
            .text_field("a", "1")
            .file_field("b", "b.bin", "application/octet-stream", b"\x00\x01")
            .build();
        let parts = MultipartParser::parse("first", &original).unwrap();

        let rekeyed = {
            let mut builder = MultipartBuilder::with_boundary("second");
            for part in &parts {
                builder = builder.part(part.clone());
            }
            builder.build()
        };
        let reparsed = MultipartParser::parse("second", &rekeyed).unwrap();
        assert_eq!(reparsed, parts);
    }

    #[test]
    fn test_content_type() {
        let builder = MultipartBuilder::with_boundary("abc123");
        assert_eq!(
            builder.content_type(),
            "multipart/form-data; boundary=abc123"
        );
    }

    #[test]
    fn test_binary_content() {
        let binary = vec![0x00, 0xFF, 0x10, 0x20];
        let body = MultipartBuilder::with_boundary("boundary")
            .file_field("data", "binary.bin", "application/octet-stream", &binary)
            .build();

        let parts = MultipartParser::parse("boundary", &body).unwrap();
        assert_eq!(parts[0].body(), &binary[..]);
    }
}

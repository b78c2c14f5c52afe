//! multipart パート
//!
//! ヘッダーブロックと収集済みボディを持つパート表現。ストリーミング中の
//! パートは [`PartHeaders`] と遅延ボディの組として扱われ、ボディを収集
//! した時点でこの [`Part`] になる。

use crate::header::PartHeaders;

/// ボディを収集済みの multipart パート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// ヘッダーブロック
    headers: PartHeaders,
    /// ボディ
    body: Vec<u8>,
}

impl Part {
    /// テキストフィールド用のパートを作成
    pub fn new(name: &str) -> Self {
        Part {
            headers: PartHeaders::new(name),
            body: Vec::new(),
        }
    }

    /// ファイルパートを作成
    pub fn file(name: &str, filename: &str, content_type: &str) -> Self {
        Part {
            headers: PartHeaders::new(name)
                .with_filename(filename)
                .with_content_type(content_type),
            body: Vec::new(),
        }
    }

    /// ヘッダーブロックとボディからパートを作成
    pub fn from_parts(headers: PartHeaders, body: Vec<u8>) -> Self {
        Part { headers, body }
    }

    /// ボディを設定
    pub fn with_body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    /// ヘッダーブロックを取得
    pub fn headers(&self) -> &PartHeaders {
        &self.headers
    }

    /// ヘッダーブロックを可変で取得
    pub fn headers_mut(&mut self) -> &mut PartHeaders {
        &mut self.headers
    }

    /// パートの名前を取得
    pub fn name(&self) -> &str {
        self.headers.name()
    }

    /// ファイル名を取得
    pub fn filename(&self) -> Option<&str> {
        self.headers.filename()
    }

    /// Content-Type を取得
    pub fn content_type(&self) -> Option<&str> {
        self.headers.content_type()
    }

    /// ボディを取得
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// ボディを文字列として取得
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// ボディを差し替え
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    /// ファイルパートかどうか
    pub fn is_file(&self) -> bool {
        self.headers.is_file()
    }

    /// ヘッダーブロックとボディに分解
    pub fn into_parts(self) -> (PartHeaders, Vec<u8>) {
        (self.headers, self.body)
    }
}

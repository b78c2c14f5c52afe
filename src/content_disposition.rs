//! Content-Disposition ヘッダーパース (RFC 7578)
//!
//! ## 概要
//!
//! multipart/form-data のパートヘッダーに現れる `form-data` ディスポジション
//! のパース/生成を提供します。引用符付きパラメータ値のバックスラッシュ
//! エスケープに対応します。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_multipart::ContentDisposition;
//!
//! let cd = ContentDisposition::parse("form-data; name=\"file\"; filename=\"a.txt\"").unwrap();
//! assert_eq!(cd.name(), "file");
//! assert_eq!(cd.filename(), Some("a.txt"));
//! ```

use core::fmt;
use std::borrow::Cow;

/// Content-Disposition パースエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDispositionError {
    /// 空の入力
    Empty,
    /// ディスポジションタイプが form-data ではない
    NotFormData,
    /// `key=value` 形式ではないパラメータ
    InvalidParameter(String),
    /// 閉じられていない引用符
    MismatchedQuotes,
    /// name パラメータがない、または空
    MissingName,
}

impl fmt::Display for ContentDispositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentDispositionError::Empty => write!(f, "empty content-disposition"),
            ContentDispositionError::NotFormData => {
                write!(f, "disposition type is not form-data")
            }
            ContentDispositionError::InvalidParameter(param) => {
                write!(f, "invalid parameter: {}", param)
            }
            ContentDispositionError::MismatchedQuotes => write!(f, "mismatched quotes"),
            ContentDispositionError::MissingName => write!(f, "missing name parameter"),
        }
    }
}

impl std::error::Error for ContentDispositionError {}

/// form-data の Content-Disposition ヘッダー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    /// name パラメータ (必須、非空)
    name: String,
    /// filename パラメータ
    filename: Option<String>,
    /// その他のパラメータ (小文字化したキーと値)
    parameters: Vec<(String, String)>,
}

impl ContentDisposition {
    /// Content-Disposition ヘッダー値をパース
    ///
    /// 最初のトークンは `form-data` そのもの (大文字小文字を区別) で
    /// なければならない。以降のトークンはすべて `key=value` 形式で、値は
    /// 裸トークンか引用符付き文字列。引用符内の `\` は次の 1 文字を
    /// そのまま表す。
    ///
    /// # 例
    ///
    /// ```rust
    /// use shiguredo_multipart::ContentDisposition;
    ///
    /// let cd = ContentDisposition::parse(r#"form-data; name="fi\"eld""#).unwrap();
    /// assert_eq!(cd.name(), "fi\"eld");
    /// ```
    pub fn parse(input: &str) -> Result<Self, ContentDispositionError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ContentDispositionError::Empty);
        }

        let segments = split_params(input);
        let disposition_type = segments
            .first()
            .ok_or(ContentDispositionError::Empty)?
            .trim();
        if disposition_type != "form-data" {
            return Err(ContentDispositionError::NotFormData);
        }

        let mut name = None;
        let mut filename = None;
        let mut parameters = Vec::new();

        for segment in segments.iter().skip(1) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let (key, raw_value) = segment
                .split_once('=')
                .ok_or_else(|| ContentDispositionError::InvalidParameter(segment.to_string()))?;
            let key = key.trim().to_ascii_lowercase();
            let value = parse_param_value(raw_value)?;

            match key.as_str() {
                "name" => name = Some(value),
                "filename" => filename = Some(value),
                _ => parameters.push((key, value)),
            }
        }

        let name = name.filter(|n| !n.is_empty());
        Ok(ContentDisposition {
            name: name.ok_or(ContentDispositionError::MissingName)?,
            filename,
            parameters,
        })
    }

    /// 新しい form-data ディスポジションを作成
    pub fn new(name: &str) -> Self {
        ContentDisposition {
            name: name.to_string(),
            filename: None,
            parameters: Vec::new(),
        }
    }

    /// filename を設定
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }

    /// name を取得
    pub fn name(&self) -> &str {
        &self.name
    }

    /// filename を取得
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// その他のパラメータを取得
    pub fn parameter(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.parameters
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ContentDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "form-data; name=\"{}\"", escape_quoted(&self.name))?;
        if let Some(filename) = &self.filename {
            write!(f, "; filename=\"{}\"", escape_quoted(filename))?;
        }
        for (key, value) in &self.parameters {
            write!(f, "; {}=\"{}\"", key, escape_quoted(value))?;
        }
        Ok(())
    }
}

/// セミコロンの位置でヘッダー値を切り出す
///
/// 引用符の内側のセミコロンは区切りとして扱わない。引用符内の `\` は
/// 直後の 1 バイトを無効化するため、エスケープされた `"` で引用が閉じる
/// ことはない。切り出した区間は入力のスライスをそのまま返す。
fn split_params(input: &str) -> Vec<&str> {
    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut segment_start = 0;
    let mut in_quotes = false;

    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quotes => i += 1,
            b'"' => in_quotes = !in_quotes,
            b';' if !in_quotes => {
                segments.push(&input[segment_start..i]);
                segment_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if segment_start < bytes.len() {
        segments.push(&input[segment_start..]);
    }
    segments
}

/// パラメータ値をパース (裸トークンまたは引用符付き文字列)
fn parse_param_value(raw: &str) -> Result<String, ContentDispositionError> {
    let raw = raw.trim();
    let Some(rest) = raw.strip_prefix('"') else {
        // 裸トークン
        return Ok(raw.to_string());
    };

    let mut value = String::with_capacity(rest.len());
    let mut chars = rest.chars();
    loop {
        match chars.next() {
            None => return Err(ContentDispositionError::MismatchedQuotes),
            Some('\\') => match chars.next() {
                // エスケープされたバイトはそのまま復元される
                Some(c) => value.push(c),
                None => return Err(ContentDispositionError::MismatchedQuotes),
            },
            Some('"') => {
                if !chars.as_str().trim().is_empty() {
                    return Err(ContentDispositionError::InvalidParameter(raw.to_string()));
                }
                return Ok(value);
            }
            Some(c) => value.push(c),
        }
    }
}

/// 引用符付き文字列用に `"` と `\` をエスケープ
///
/// エスケープ対象を含まない値 (大多数) は借用のまま返す。
pub(crate) fn escape_quoted(s: &str) -> Cow<'_, str> {
    if !s.bytes().any(|b| matches!(b, b'"' | b'\\')) {
        return Cow::Borrowed(s);
    }
    let mut escaped = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

use std::fmt;

use crate::content_disposition::ContentDispositionError;

/// multipart パースエラー
///
/// フレーミング違反 (閉じデリミタ前の EOF、ヘッダーブロック内の境界) と
/// ヘッダー違反 (コロン欠落、Content-Disposition 不備) の両方を表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 閉じデリミタの前に入力が終了した
    UnexpectedEof,
    /// ヘッダーブロックの途中で境界が出現した (空のヘッダーブロックを含む)
    EmptyHeaderBlock,
    /// 不正なヘッダー行
    InvalidHeaderLine(String),
    /// Content-Disposition ヘッダーがない
    MissingContentDisposition,
    /// Content-Disposition の形式が不正
    ContentDisposition(ContentDispositionError),
    /// Content-Transfer-Encoding の値が不正
    InvalidContentTransferEncoding(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedEof => {
                write!(f, "unexpected end of input before closing delimiter")
            }
            Error::EmptyHeaderBlock => {
                write!(f, "unexpected boundary inside part header block")
            }
            Error::InvalidHeaderLine(msg) => write!(f, "invalid header line: {}", msg),
            Error::MissingContentDisposition => {
                write!(f, "missing Content-Disposition header in part")
            }
            Error::ContentDisposition(e) => write!(f, "invalid Content-Disposition: {}", e),
            Error::InvalidContentTransferEncoding(value) => {
                write!(f, "invalid Content-Transfer-Encoding: {}", value)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<ContentDispositionError> for Error {
    fn from(e: ContentDispositionError) -> Self {
        Error::ContentDisposition(e)
    }
}

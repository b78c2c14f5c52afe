//! tokio-multipart エラー型

use std::fmt;

/// transform コールバックが返す任意のエラー
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// tokio-multipart エラー
#[derive(Debug)]
pub enum Error {
    /// multipart パースエラー
    Parse(shiguredo_multipart::Error),
    /// 入力ソースの I/O エラー
    Source(std::io::Error),
    /// transform コールバックが返したエラー
    Transform(BoxError),
    /// Content-Type から境界を取り出せない
    InvalidContentType(String),
    /// エラーで停止したストリームを再度読んだ
    Failed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "multipart parse error: {}", e),
            Error::Source(e) => write!(f, "source error: {}", e),
            Error::Transform(e) => write!(f, "transform error: {}", e),
            Error::InvalidContentType(msg) => write!(f, "invalid content type: {}", msg),
            Error::Failed => write!(f, "multipart stream already failed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Source(e) => Some(e),
            Error::Transform(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<shiguredo_multipart::Error> for Error {
    fn from(e: shiguredo_multipart::Error) -> Self {
        Error::Parse(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Source(e)
    }
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

/// 停止したストリームが繰り返し返すエラーの記録
///
/// パースエラーは複製できるので同じエラーを返し続ける。I/O エラーと
/// transform エラーは複製できないため、2 回目以降は [`Error::Failed`] に
/// 縮退する。
#[derive(Debug, Clone)]
pub(crate) enum Failure {
    Parse(shiguredo_multipart::Error),
    Terminal,
}

impl Failure {
    pub(crate) fn record(error: &Error) -> Self {
        match error {
            Error::Parse(e) => Failure::Parse(e.clone()),
            _ => Failure::Terminal,
        }
    }

    pub(crate) fn to_error(&self) -> Error {
        match self {
            Failure::Parse(e) => Error::Parse(e.clone()),
            Failure::Terminal => Error::Failed,
        }
    }
}

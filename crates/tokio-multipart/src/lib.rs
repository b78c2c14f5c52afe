//! tokio_multipart - Tokio integration for shiguredo_multipart
//!
//! tokio を使用した非同期 multipart/form-data ストリーム処理ライブラリ。
//!
//! ## 特徴
//!
//! - **shiguredo_multipart ベース**: Sans I/O ライブラリをベースにした設計
//! - **非同期 I/O**: tokio による完全非同期対応
//! - **ストリーミング**: パート全体をバッファせずに読み書き
//! - **再発行**: フィルタ/変換を適用した multipart ストリームの組み立て
//!
//! ## パース
//!
//! ```ignore
//! use tokio_multipart::{stream_multipart, ReaderSource};
//!
//! let source = ReaderSource::new(socket);
//! let mut stream = stream_multipart(source, boundary);
//!
//! while let Some(mut part) = stream.next_part().await? {
//!     println!("name: {}", part.name());
//!     while let Some(chunk) = part.next_chunk().await? {
//!         // ボディ断片を逐次処理
//!     }
//! }
//! ```
//!
//! ## 再発行
//!
//! ```ignore
//! use tokio_multipart::{FilterDecision, FormData, TransformDecision};
//!
//! let mut output = FormData::from_content_type(source, content_type)?
//!     .filter(|headers| {
//!         if headers.is_file() { FilterDecision::keep() } else { FilterDecision::skip() }
//!     })
//!     .transform(|mut part| async move {
//!         part.set_body(b"redacted".to_vec());
//!         Ok(TransformDecision::emit(part))
//!     })
//!     .output_boundary("new-boundary")
//!     .into_stream();
//!
//! while let Some(chunk) = output.next_chunk().await? {
//!     // chunk を送信
//! }
//! ```

pub mod error;
pub mod reemit;
pub mod search_stream;
pub mod source;
mod stream;

pub use error::{BoxError, Error, Result};
pub use reemit::{parse_boundary, FilterDecision, FormData, FormDataStream, TransformDecision};
pub use search_stream::SearchStream;
pub use source::{ByteSource, ChunkedSource, ReaderSource};
pub use stream::{
    iterate_multipart, parse_multipart, stream_multipart, MultipartStream, PartIterator,
    StreamingPart,
};

// shiguredo_multipart の型を re-export
pub use shiguredo_multipart::{
    ContentTransferEncoding, MultipartParser, Part, PartEvent, PartHeaders,
};

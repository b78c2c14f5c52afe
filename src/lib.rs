//! # shiguredo_multipart
//!
//! 依存なしの multipart/form-data ストリーミングパーサー/シリアライザ (Sans I/O)
//!
//! ## 特徴
//!
//! - **依存なし**: 標準ライブラリのみ使用
//! - **Sans I/O**: I/O を完全に分離した設計
//! - **ストリーミング**: パート全体をバッファせず、チャンク境界をまたぐ
//!   境界一致も見逃さない (RFC 7578 / RFC 2046)
//!
//! ## 使い方
//!
//! ### 一括パース
//!
//! ```rust
//! use shiguredo_multipart::MultipartParser;
//!
//! let payload = b"--bnd\r\n\
//!     Content-Disposition: form-data; name=\"greeting\"\r\n\r\n\
//!     hello\r\n\
//!     --bnd--";
//!
//! let parts = MultipartParser::parse("bnd", payload).unwrap();
//! assert_eq!(parts[0].name(), "greeting");
//! assert_eq!(parts[0].body(), b"hello");
//! ```
//!
//! ### ストリーミングパース
//!
//! ```rust
//! use shiguredo_multipart::{MultipartParser, PartEvent};
//!
//! let mut parser = MultipartParser::new("bnd");
//! // 受信したチャンクを順に投入し、確定したイベントを消費する
//! for event in parser.feed(b"--bnd\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nbo").unwrap() {
//!     if let PartEvent::Headers(headers) = &event {
//!         assert_eq!(headers.name(), "a");
//!     }
//! }
//! ```
//!
//! ### 生成
//!
//! ```rust
//! use shiguredo_multipart::MultipartBuilder;
//!
//! let body = MultipartBuilder::with_boundary("bnd")
//!     .text_field("field1", "value1")
//!     .file_field("file", "a.txt", "text/plain", b"file body")
//!     .build();
//! ```
//!
//! 非同期 I/O との統合 (tokio) は `tokio-multipart` クレートが提供する。

pub mod bytes;
pub mod content_disposition;
mod encoder;
mod error;
mod header;
mod parser;
mod part;
mod stream_search;

pub use content_disposition::{ContentDisposition, ContentDispositionError};
pub use encoder::{build_header_lines, MultipartBuilder, MultipartSerializer};
pub use error::Error;
pub use header::{ContentTransferEncoding, PartHeaders};
pub use parser::{MultipartParser, PartEvent};
pub use part::Part;
pub use stream_search::{StreamSearch, Token};

//! 非同期バイトソース
//!
//! プラットフォーム固有のバイトストリームを、オーナーシップ付きチャンクを
//! 逐次引き出す抽象 ([`ByteSource`]) に統一する。`None` が EOF を表す。

use std::collections::VecDeque;
use std::future::Future;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// プル型の非同期バイトソース
///
/// 読み手は常に 1 つ。長さ 0 のチャンクを返してもよく、消費側はそれを
/// 許容しなければならない。
pub trait ByteSource {
    /// 次のチャンクを取得する。EOF で `None`。
    fn next_chunk(&mut self) -> impl Future<Output = io::Result<Option<Vec<u8>>>> + Send;
}

/// [`AsyncRead`] をバイトソースに変換するアダプタ
///
/// ## 使い方
///
/// ```ignore
/// use tokio_multipart::{ByteSource, ReaderSource};
///
/// let file = tokio::fs::File::open("upload.bin").await?;
/// let mut source = ReaderSource::new(file);
/// while let Some(chunk) = source.next_chunk().await? {
///     // chunk を処理
/// }
/// ```
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    buffer_size: usize,
}

impl<R: AsyncRead + Unpin + Send> ReaderSource<R> {
    /// 新しいアダプタを作成 (読み取りバッファは 8KB)
    pub fn new(reader: R) -> Self {
        ReaderSource {
            reader,
            buffer_size: 8192,
        }
    }

    /// 読み取りバッファサイズを設定
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// 内部のリーダーを取り出す
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncRead + Unpin + Send> ByteSource for ReaderSource<R> {
    async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.buffer_size];
        let n = self.reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(buf))
    }
}

/// チャネル受信側をそのままバイトソースとして使う
///
/// 送信側をドロップした時点が EOF になる。
impl ByteSource for tokio::sync::mpsc::Receiver<Vec<u8>> {
    async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.recv().await)
    }
}

/// 予め分割されたチャンク列を流すバイトソース
///
/// メモリ上のペイロードの投入と、チャンク分割位置に依存しないことの
/// 検証に使う。
#[derive(Debug, Clone)]
pub struct ChunkedSource {
    chunks: VecDeque<Vec<u8>>,
}

impl ChunkedSource {
    /// チャンク列から作成
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        ChunkedSource {
            chunks: chunks.into(),
        }
    }

    /// ペイロードを固定サイズで分割して作成
    pub fn from_bytes(payload: &[u8], chunk_size: usize) -> Self {
        ChunkedSource {
            chunks: payload
                .chunks(chunk_size.max(1))
                .map(|c| c.to_vec())
                .collect(),
        }
    }

    /// ペイロード全体を 1 チャンクで流す
    pub fn whole(payload: &[u8]) -> Self {
        ChunkedSource {
            chunks: VecDeque::from(vec![payload.to_vec()]),
        }
    }
}

impl ByteSource for ChunkedSource {
    async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(self.chunks.pop_front())
    }
}

//! パートストリーム
//!
//! バイトソースと Sans I/O パーサーを束ね、パートを順に引き出す非同期
//! サーフェスを提供する。ボディは遅延取得で、パート全体をバッファしない。

use std::collections::VecDeque;

use shiguredo_multipart::{MultipartParser, Part, PartEvent, PartHeaders};

use crate::error::{Failure, Result};
use crate::source::ByteSource;

/// バイトソースを遅延ボディ付きパートの列として読む
pub fn stream_multipart<S: ByteSource>(source: S, boundary: &str) -> MultipartStream<S> {
    MultipartStream::new(source, boundary)
}

/// バイトソースを収集済みボディ付きパートの列として読む
pub fn iterate_multipart<S: ByteSource>(source: S, boundary: &str) -> PartIterator<S> {
    PartIterator {
        stream: MultipartStream::new(source, boundary),
    }
}

/// バイトソースの全パートを一括で読み取る
pub async fn parse_multipart<S: ByteSource>(source: S, boundary: &str) -> Result<Vec<Part>> {
    let mut iter = iterate_multipart(source, boundary);
    let mut parts = Vec::new();
    while let Some(part) = iter.next_part().await? {
        parts.push(part);
    }
    Ok(parts)
}

/// バイトソースをパーサーに送り込み、イベントを順に取り出す駆動部
///
/// [`MultipartStream`] と再発行パイプラインで共有される。
#[derive(Debug)]
pub(crate) struct Driver<S> {
    source: S,
    parser: MultipartParser,
    events: VecDeque<PartEvent>,
    source_eof: bool,
    failure: Option<Failure>,
}

impl<S: ByteSource> Driver<S> {
    pub(crate) fn new(source: S, boundary: &str) -> Self {
        Driver {
            source,
            parser: MultipartParser::new(boundary),
            events: VecDeque::new(),
            source_eof: false,
            failure: None,
        }
    }

    /// 次のパースイベントを取得する
    ///
    /// イベントが出るまでソースからチャンクを引き続ける。ソースの終端では
    /// パーサーに EOF を通知し、閉じデリミタ未検出ならエラーになる。
    /// 一度エラーを返した後の呼び出しは停止エラーを返し続ける。
    pub(crate) async fn next_event(&mut self) -> Result<Option<PartEvent>> {
        if let Some(failure) = &self.failure {
            return Err(failure.to_error());
        }
        loop {
            if let Some(event) = self.events.pop_front() {
                return Ok(Some(event));
            }
            if self.source_eof {
                return Ok(None);
            }
            if let Err(e) = self.pump().await {
                self.failure = Some(Failure::record(&e));
                return Err(e);
            }
        }
    }

    async fn pump(&mut self) -> Result<()> {
        match self.source.next_chunk().await? {
            Some(chunk) => self.events.extend(self.parser.feed(&chunk)?),
            None => {
                self.source_eof = true;
                self.events.extend(self.parser.finish()?);
            }
        }
        Ok(())
    }
}

/// 遅延ボディ付きパートのストリーム
///
/// ## 使い方
///
/// ```ignore
/// use tokio_multipart::stream_multipart;
///
/// let mut stream = stream_multipart(source, "boundary");
/// while let Some(mut part) = stream.next_part().await? {
///     println!("name: {}", part.name());
///     while let Some(chunk) = part.next_chunk().await? {
///         // ボディ断片を逐次処理
///     }
/// }
/// ```
///
/// ボディハンドルはストリームを可変借用するため、`next_part` を呼んだ
/// 時点で前のパートのハンドルは使えなくなる。未読のボディは次のパートを
/// 要求した際に読み捨てられる。
#[derive(Debug)]
pub struct MultipartStream<S> {
    driver: Driver<S>,
    in_body: bool,
    finished: bool,
}

impl<S: ByteSource> MultipartStream<S> {
    /// 新しいストリームを作成
    pub fn new(source: S, boundary: &str) -> Self {
        MultipartStream {
            driver: Driver::new(source, boundary),
            in_body: false,
            finished: false,
        }
    }

    /// 次のパートを取得する。閉じデリミタに達したら `None`。
    pub async fn next_part(&mut self) -> Result<Option<StreamingPart<'_, S>>> {
        if self.finished {
            return Ok(None);
        }

        // 前のパートの未読ボディを読み捨てる
        while self.in_body {
            match self.driver.next_event().await? {
                Some(PartEvent::PartEnd) | None => self.in_body = false,
                Some(_) => {}
            }
        }

        loop {
            match self.driver.next_event().await? {
                Some(PartEvent::Headers(headers)) => {
                    self.in_body = true;
                    return Ok(Some(StreamingPart {
                        stream: self,
                        headers,
                        done: false,
                    }));
                }
                Some(PartEvent::Finished) | None => {
                    self.finished = true;
                    return Ok(None);
                }
                Some(_) => {}
            }
        }
    }
}

/// ボディを遅延取得するパートハンドル
///
/// 消費者は 1 つだけ。ボディのバイトは入力順にちょうど 1 回ずつ観測される。
#[derive(Debug)]
pub struct StreamingPart<'a, S> {
    stream: &'a mut MultipartStream<S>,
    headers: PartHeaders,
    done: bool,
}

impl<S: ByteSource> StreamingPart<'_, S> {
    /// ヘッダーブロックを取得
    pub fn headers(&self) -> &PartHeaders {
        &self.headers
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

    /// 次のボディ断片を取得する。ボディの終端で `None`。
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.done {
            return Ok(None);
        }
        match self.stream.driver.next_event().await? {
            Some(PartEvent::BodyChunk(chunk)) => Ok(Some(chunk)),
            _ => {
                self.done = true;
                self.stream.in_body = false;
                Ok(None)
            }
        }
    }

    /// ボディを収集してパートにする
    pub async fn collect(mut self) -> Result<Part> {
        let mut body = Vec::new();
        while let Some(chunk) = self.next_chunk().await? {
            body.extend_from_slice(&chunk);
        }
        Ok(Part::from_parts(self.headers, body))
    }
}

/// 収集済みボディ付きパートのイテレータ
pub struct PartIterator<S> {
    stream: MultipartStream<S>,
}

impl<S: ByteSource> PartIterator<S> {
    /// 次のパートをボディごと取得する
    pub async fn next_part(&mut self) -> Result<Option<Part>> {
        match self.stream.next_part().await? {
            Some(part) => Ok(Some(part.collect().await?)),
            None => Ok(None),
        }
    }
}

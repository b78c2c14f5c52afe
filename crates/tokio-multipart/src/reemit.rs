//! multipart ストリームの再発行
//!
//! ## 概要
//!
//! 入力のパート列にフィルタと変換を適用し、(異なってもよい) 出力境界で
//! 新しい multipart バイトストリームを組み立てる。出力のバイト順は入力
//! 順に並んだ採用パートのシリアライズ結果の連結そのもの。
//!
//! 変換を指定しないパートのボディは収集されず、断片のまま出力に流れる。
//! 変換を指定した場合はボディを収集してから変換を await する。
//!
//! ## 使い方
//!
//! ```ignore
//! use tokio_multipart::{FilterDecision, FormData, TransformDecision};
//!
//! let mut output = FormData::new(source, "bnd")
//!     .filter(|headers| {
//!         if headers.is_file() { FilterDecision::keep() } else { FilterDecision::skip() }
//!     })
//!     .output_boundary("new-bnd")
//!     .into_stream();
//!
//! while let Some(chunk) = output.next_chunk().await? {
//!     // chunk を送信
//! }
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::pin::Pin;

use shiguredo_multipart::{MultipartSerializer, Part, PartEvent, PartHeaders};

use crate::error::{BoxError, Error, Failure, Result};
use crate::source::ByteSource;
use crate::stream::Driver;

/// フィルタの判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDecision {
    /// このパートを出力に採用するか
    pub keep: bool,
    /// このパートの処理後にストリーム全体を終了するか
    pub stop: bool,
}

impl FilterDecision {
    /// パートを採用する
    pub fn keep() -> Self {
        FilterDecision {
            keep: true,
            stop: false,
        }
    }

    /// パートを読み捨てる
    pub fn skip() -> Self {
        FilterDecision {
            keep: false,
            stop: false,
        }
    }

    /// このパートの処理後に終了する
    pub fn and_stop(mut self) -> Self {
        self.stop = true;
        self
    }
}

/// 変換の結果
#[derive(Debug)]
pub struct TransformDecision {
    /// 出力するパート。`None` なら破棄
    pub part: Option<Part>,
    /// このパートのシリアライズ後にストリーム全体を終了するか
    pub stop: bool,
}

impl TransformDecision {
    /// パートを出力する
    pub fn emit(part: Part) -> Self {
        TransformDecision {
            part: Some(part),
            stop: false,
        }
    }

    /// パートを破棄する
    pub fn discard() -> Self {
        TransformDecision {
            part: None,
            stop: false,
        }
    }

    /// このパートの後に終了する
    pub fn and_stop(mut self) -> Self {
        self.stop = true;
        self
    }
}

type FilterFn = Box<dyn FnMut(&PartHeaders) -> FilterDecision + Send>;
type TransformFuture = Pin<Box<dyn Future<Output = std::result::Result<TransformDecision, BoxError>> + Send>>;
type TransformFn = Box<dyn FnMut(Part) -> TransformFuture + Send>;

/// Content-Type ヘッダー値から boundary パラメータを取り出す
///
/// 形式: `multipart/form-data; boundary=----WebKitFormBoundary...`
pub fn parse_boundary(content_type: &str) -> Result<String> {
    let trimmed = content_type.trim();
    if !trimmed
        .to_ascii_lowercase()
        .starts_with("multipart/form-data")
    {
        return Err(Error::InvalidContentType(format!(
            "not multipart/form-data: {}",
            trimmed
        )));
    }

    for param in trimmed.split(';').skip(1) {
        let param = param.trim();
        if let Some((key, value)) = param.split_once('=') {
            if key.trim().eq_ignore_ascii_case("boundary") {
                let boundary = value.trim().trim_matches('"');
                if boundary.is_empty() {
                    return Err(Error::InvalidContentType("empty boundary".to_string()));
                }
                return Ok(boundary.to_string());
            }
        }
    }
    Err(Error::InvalidContentType(
        "missing boundary parameter".to_string(),
    ))
}

/// 再発行パイプラインのビルダー
pub struct FormData<S> {
    source: S,
    boundary: String,
    output_boundary: Option<String>,
    filter: Option<FilterFn>,
    transform: Option<TransformFn>,
}

impl<S: ByteSource> FormData<S> {
    /// 入力境界を指定して作成
    pub fn new(source: S, boundary: &str) -> Self {
        FormData {
            source,
            boundary: boundary.to_string(),
            output_boundary: None,
            filter: None,
            transform: None,
        }
    }

    /// Content-Type ヘッダー値から入力境界を取り出して作成
    pub fn from_content_type(source: S, content_type: &str) -> Result<Self> {
        let boundary = parse_boundary(content_type)?;
        Ok(FormData::new(source, &boundary))
    }

    /// フィルタを設定
    ///
    /// パートのヘッダーが揃った時点で呼ばれる。読み捨てられたパートの
    /// ボディは消費されるが出力には現れない。
    pub fn filter(mut self, f: impl FnMut(&PartHeaders) -> FilterDecision + Send + 'static) -> Self {
        self.filter = Some(Box::new(f));
        self
    }

    /// 変換を設定
    ///
    /// フィルタを通過したパートはボディ収集後にこのコールバックへ渡される。
    /// コールバックが解決するまでパイプラインは先に進まない。
    pub fn transform<F, Fut>(mut self, mut f: F) -> Self
    where
        F: FnMut(Part) -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<TransformDecision, BoxError>> + Send + 'static,
    {
        self.transform = Some(Box::new(move |part| Box::pin(f(part))));
        self
    }

    /// 出力境界を設定 (省略時は入力境界を再利用)
    pub fn output_boundary(mut self, boundary: &str) -> Self {
        self.output_boundary = Some(boundary.to_string());
        self
    }

    /// 出力バイトストリームを構築
    pub fn into_stream(self) -> FormDataStream<S> {
        let output_boundary = self
            .output_boundary
            .unwrap_or_else(|| self.boundary.clone());
        FormDataStream {
            driver: Driver::new(self.source, &self.boundary),
            serializer: MultipartSerializer::new(&output_boundary),
            filter: self.filter,
            transform: self.transform,
            output: VecDeque::new(),
            part_state: PartState::Idle,
            stop_requested: false,
            done: false,
            failure: None,
        }
    }
}

/// 現在のパートの扱い
#[derive(Debug)]
enum PartState {
    /// パート間
    Idle,
    /// フィルタで読み捨て中
    Skipping,
    /// 変換なし: ボディ断片をそのまま出力へ
    Streaming,
    /// 変換のためにボディを収集中
    Collecting { headers: PartHeaders, body: Vec<u8> },
}

/// 再発行された multipart バイトストリーム
///
/// それ自身が [`ByteSource`] なので、出力をそのまま別のパーサーや
/// 転送路に接続できる。
pub struct FormDataStream<S> {
    driver: Driver<S>,
    serializer: MultipartSerializer,
    filter: Option<FilterFn>,
    transform: Option<TransformFn>,
    output: VecDeque<Vec<u8>>,
    part_state: PartState,
    stop_requested: bool,
    done: bool,
    failure: Option<Failure>,
}

impl<S: ByteSource> FormDataStream<S> {
    /// 出力境界を取得
    pub fn boundary(&self) -> &str {
        self.serializer.boundary()
    }

    /// 次の出力チャンクを取得する。閉じデリミタまで書き切ったら `None`。
    ///
    /// パース、ソース、変換いずれかのエラーはここに伝播し、以後の
    /// 呼び出しは停止エラーを返し続ける。
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if let Some(failure) = &self.failure {
            return Err(failure.to_error());
        }
        loop {
            if let Some(bytes) = self.output.pop_front() {
                if bytes.is_empty() {
                    continue;
                }
                return Ok(Some(bytes));
            }
            if self.done {
                return Ok(None);
            }
            if let Err(e) = self.advance().await {
                self.failure = Some(Failure::record(&e));
                return Err(e);
            }
        }
    }

    /// 入力イベントを 1 つ処理する
    async fn advance(&mut self) -> Result<()> {
        match self.driver.next_event().await? {
            Some(PartEvent::Headers(headers)) => {
                let decision = match self.filter.as_mut() {
                    Some(filter) => filter(&headers),
                    None => FilterDecision::keep(),
                };
                if decision.stop {
                    self.stop_requested = true;
                }
                self.part_state = if !decision.keep {
                    PartState::Skipping
                } else if self.transform.is_some() {
                    PartState::Collecting {
                        headers,
                        body: Vec::new(),
                    }
                } else {
                    let head = self.serializer.part_head(&headers);
                    self.output.push_back(head);
                    PartState::Streaming
                };
            }
            Some(PartEvent::BodyChunk(chunk)) => match &mut self.part_state {
                PartState::Streaming => self.output.push_back(chunk),
                PartState::Collecting { body, .. } => body.extend_from_slice(&chunk),
                PartState::Skipping | PartState::Idle => {}
            },
            Some(PartEvent::PartEnd) => {
                if let PartState::Collecting { headers, body } =
                    std::mem::replace(&mut self.part_state, PartState::Idle)
                {
                    let part = Part::from_parts(headers, body);
                    let decision = match self.transform.as_mut() {
                        Some(transform) => transform(part).await.map_err(Error::Transform)?,
                        None => TransformDecision::emit(part),
                    };
                    if let Some(part) = decision.part {
                        let (headers, body) = part.into_parts();
                        self.output.push_back(self.serializer.part_head(&headers));
                        if !body.is_empty() {
                            self.output.push_back(body);
                        }
                    }
                    if decision.stop {
                        self.stop_requested = true;
                    }
                }
                if self.stop_requested {
                    self.finish_output();
                }
            }
            Some(PartEvent::Finished) | None => self.finish_output(),
        }
        Ok(())
    }

    /// 閉じデリミタを書いてストリームを終える
    fn finish_output(&mut self) {
        if !self.done {
            let close = self.serializer.close();
            self.output.push_back(close);
            self.done = true;
        }
    }
}

impl<S: ByteSource + Send> ByteSource for FormDataStream<S> {
    async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        FormDataStream::next_chunk(self).await.map_err(io::Error::other)
    }
}

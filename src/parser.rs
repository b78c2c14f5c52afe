//! multipart/form-data ストリーミングパーサー (RFC 7578)
//!
//! ## 概要
//!
//! Sans I/O 設計のストリーミングパーサーを提供します。任意の大きさの
//! チャンクを [`MultipartParser::feed`] に投入すると、確定したイベント
//! (ヘッダー確定、ボディ断片、パート終端、閉じデリミタ検出) が順に返り
//! ます。パート全体をバッファすることはなく、メモリ使用量はヘッダー
//! ブロック 1 つ分とニードル長、チャンク長の和に収まります。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_multipart::MultipartParser;
//!
//! let payload = b"--bnd\r\n\
//!     Content-Disposition: form-data; name=\"a\"\r\n\r\n\
//!     form value a\r\n\
//!     --bnd--";
//!
//! let parts = MultipartParser::parse("bnd", payload).unwrap();
//! assert_eq!(parts.len(), 1);
//! assert_eq!(parts[0].name(), "a");
//! assert_eq!(parts[0].body(), b"form value a");
//! ```
//!
//! ストリーミングで使う場合はイベントを直接消費する:
//!
//! ```rust
//! use shiguredo_multipart::{MultipartParser, PartEvent};
//!
//! let mut parser = MultipartParser::new("bnd");
//! let mut events = Vec::new();
//! // チャンクの分割位置は結果に影響しない
//! for chunk in [&b"--bnd\r\nContent-Disposition: form-data; name=\"a\""[..],
//!               &b"\r\n\r\nvalue\r\n--bnd--"[..]] {
//!     events.extend(parser.feed(chunk).unwrap());
//! }
//! events.extend(parser.finish().unwrap());
//! assert!(matches!(events.last(), Some(PartEvent::Finished)));
//! ```

use crate::bytes::{CRLF, DOUBLE_DASH};
use crate::error::Error;
use crate::header::PartHeaders;
use crate::part::Part;
use crate::stream_search::{StreamSearch, Token};

/// パーサーが払い出すイベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartEvent {
    /// パートのヘッダーブロックが揃った
    Headers(PartHeaders),
    /// 現在のパートのボディ断片
    BodyChunk(Vec<u8>),
    /// 現在のパートのボディが終了した
    PartEnd,
    /// 閉じデリミタを検出した (以降のエピローグは読み捨てられる)
    Finished,
}

/// multipart ストリーミングパーサー
///
/// `--<境界>` をニードルとする [`StreamSearch`] がストリーム全体を駆動し、
/// その上の状態機械がプロローグ読み捨て / ヘッダー読み取り / ボディ転送 /
/// 終端検出を行う。境界の直前の CRLF は RFC 2046 の文法上の区切りであり、
/// ボディには含めない。
///
/// 閉じデリミタは境界一致直後の `--` 2 バイトで判定するため、`--` の後に
/// 続く余分なバイトは寛容に受理される (エピローグとして読み捨てる)。
#[derive(Debug, Clone)]
pub struct MultipartParser {
    /// `--<境界>` を探すスキャナ
    boundary: StreamSearch,
    /// 状態機械
    state: State,
}

#[derive(Debug, Clone)]
enum State {
    /// 最初の境界を待機 (それまでのバイトは読み捨て)
    Prologue,
    /// ヘッダーブロックを読み取り中
    Headers(HeaderReader),
    /// ボディを転送中
    Body(BodyReader),
    /// 閉じデリミタ検出後 (エピローグを読み捨て)
    Epilogue,
    /// エラーで停止
    Failed(Error),
}

impl MultipartParser {
    /// 新しいパーサーを作成
    ///
    /// `boundary` は Content-Type ヘッダーの boundary パラメータの値
    /// そのもの (先頭の `--` は含まない)。
    pub fn new(boundary: &str) -> Self {
        let mut needle = DOUBLE_DASH.to_vec();
        needle.extend_from_slice(boundary.as_bytes());
        MultipartParser {
            boundary: StreamSearch::new(&needle),
            state: State::Prologue,
        }
    }

    /// チャンクを追加し、確定したイベント列を返す
    ///
    /// 一度エラーを返すとパーサーは停止し、以後の呼び出しも同じエラーを
    /// 返す。
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<PartEvent>, Error> {
        if let State::Failed(e) = &self.state {
            return Err(e.clone());
        }
        let tokens = self.boundary.feed(chunk);
        let mut events = Vec::new();
        for token in tokens {
            if let Err(e) = self.step(token, &mut events) {
                self.state = State::Failed(e.clone());
                return Err(e);
            }
        }
        Ok(events)
    }

    /// 入力の終端を通知し、残りのイベント列を返す
    ///
    /// multipart ペイロードは閉じデリミタで終わらなければならない。
    /// 閉じデリミタを見ないまま終端に達した場合はエラー。
    pub fn finish(&mut self) -> Result<Vec<PartEvent>, Error> {
        if let State::Failed(e) = &self.state {
            return Err(e.clone());
        }
        let mut events = Vec::new();
        if let Some(residue) = self.boundary.end() {
            if let Err(e) = self.step(Token::Data(residue), &mut events) {
                self.state = State::Failed(e.clone());
                return Err(e);
            }
        }
        match self.state {
            State::Epilogue => Ok(events),
            _ => {
                self.state = State::Failed(Error::UnexpectedEof);
                Err(Error::UnexpectedEof)
            }
        }
    }

    /// 閉じデリミタを検出済みかどうか
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Epilogue)
    }

    /// ペイロード全体を一括でパース
    ///
    /// 全パートのボディを収集して返す便利メソッド。
    pub fn parse(boundary: &str, payload: &[u8]) -> Result<Vec<Part>, Error> {
        let mut parser = MultipartParser::new(boundary);
        let mut events = parser.feed(payload)?;
        events.extend(parser.finish()?);

        let mut parts = Vec::new();
        let mut current: Option<(PartHeaders, Vec<u8>)> = None;
        for event in events {
            match event {
                PartEvent::Headers(headers) => current = Some((headers, Vec::new())),
                PartEvent::BodyChunk(chunk) => {
                    if let Some((_, body)) = &mut current {
                        body.extend_from_slice(&chunk);
                    }
                }
                PartEvent::PartEnd => {
                    if let Some((headers, body)) = current.take() {
                        parts.push(Part::from_parts(headers, body));
                    }
                }
                PartEvent::Finished => break,
            }
        }
        Ok(parts)
    }

    /// トークンを 1 つ処理して状態を進める
    fn step(&mut self, token: Token, events: &mut Vec<PartEvent>) -> Result<(), Error> {
        let state = std::mem::replace(&mut self.state, State::Prologue);
        self.state = match (state, token) {
            (State::Prologue, Token::Data(_)) => State::Prologue,
            (State::Prologue, Token::Match) => State::Headers(HeaderReader::new()),

            (State::Headers(mut reader), Token::Data(data)) => match reader.feed(&data)? {
                HeaderProgress::Continue => State::Headers(reader),
                HeaderProgress::CloseDelimiter => {
                    events.push(PartEvent::Finished);
                    State::Epilogue
                }
                HeaderProgress::Complete {
                    headers,
                    body_prefix,
                } => {
                    events.push(PartEvent::Headers(headers));
                    let mut body = BodyReader::new();
                    body.feed(&body_prefix, events);
                    State::Body(body)
                }
            },
            (State::Headers(_), Token::Match) => return Err(Error::EmptyHeaderBlock),

            (State::Body(mut body), Token::Data(data)) => {
                body.feed(&data, events);
                State::Body(body)
            }
            (State::Body(mut body), Token::Match) => {
                body.finish(events);
                events.push(PartEvent::PartEnd);
                State::Headers(HeaderReader::new())
            }

            (State::Epilogue, _) => State::Epilogue,
            (State::Failed(e), _) => return Err(e),
        };
        Ok(())
    }
}

/// ヘッダーブロックの進行状況
enum HeaderProgress {
    /// データ不足
    Continue,
    /// 境界直後が `--` だった (閉じデリミタ)
    CloseDelimiter,
    /// ヘッダーブロックが完成した
    Complete {
        headers: PartHeaders,
        /// 空行の後に既に読み込んでいたボディ先頭のバイト列
        body_prefix: Vec<u8>,
    },
}

/// 境界一致後のヘッダーブロック読み取り
///
/// ヘッダー行の抽出は CRLF をニードルとする [`StreamSearch`] で行う。
/// 境界行自体を終端する最初のセグメントは読み捨て、以降のセグメントを
/// 空セグメント (空行 = CRLF 2 連続) までヘッダー行として集める。
#[derive(Debug, Clone)]
struct HeaderReader {
    /// 境界直後の 2 バイト (閉じデリミタ判定用)
    probe: Vec<u8>,
    /// 判定済みフラグ
    probed: bool,
    /// CRLF 分割用スキャナ
    line_search: StreamSearch,
    /// 組み立て中の行
    line: Vec<u8>,
    /// 完成した行
    lines: Vec<Vec<u8>>,
    /// 境界行の残りを読み捨て済みか
    boundary_line_skipped: bool,
}

impl HeaderReader {
    fn new() -> Self {
        HeaderReader {
            probe: Vec::with_capacity(2),
            probed: false,
            line_search: StreamSearch::new(CRLF),
            line: Vec::new(),
            lines: Vec::new(),
            boundary_line_skipped: false,
        }
    }

    fn feed(&mut self, data: &[u8]) -> Result<HeaderProgress, Error> {
        let mut rest = data;
        if !self.probed {
            let take = (2 - self.probe.len()).min(rest.len());
            self.probe.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.probe.len() < 2 {
                return Ok(HeaderProgress::Continue);
            }
            if self.probe.as_slice() == DOUBLE_DASH {
                return Ok(HeaderProgress::CloseDelimiter);
            }
            self.probed = true;
            let probe = std::mem::take(&mut self.probe);
            if let Some((headers, mut body_prefix)) = self.advance(&probe)? {
                body_prefix.extend_from_slice(rest);
                return Ok(HeaderProgress::Complete {
                    headers,
                    body_prefix,
                });
            }
        }
        match self.advance(rest)? {
            Some((headers, body_prefix)) => Ok(HeaderProgress::Complete {
                headers,
                body_prefix,
            }),
            None => Ok(HeaderProgress::Continue),
        }
    }

    /// バイト列を行分割し、空行を見つけたらヘッダーを完成させる
    ///
    /// 空行の後ろに続いていたトークンは Data のバイトと Match あたり
    /// CRLF 1 つとして復元し、行スキャナの残余と合わせてボディ先頭として
    /// 返す。
    fn advance(&mut self, data: &[u8]) -> Result<Option<(PartHeaders, Vec<u8>)>, Error> {
        let tokens = self.line_search.feed(data);
        let mut iter = tokens.into_iter();
        while let Some(token) = iter.next() {
            match token {
                Token::Data(data) => self.line.extend_from_slice(&data),
                Token::Match => {
                    if !self.boundary_line_skipped {
                        // 境界行の残り (transport padding) は読み捨てる
                        self.boundary_line_skipped = true;
                        self.line.clear();
                    } else if self.line.is_empty() {
                        let headers = PartHeaders::from_lines(std::mem::take(&mut self.lines))?;
                        let mut body_prefix = Vec::new();
                        for token in iter {
                            match token {
                                Token::Data(data) => body_prefix.extend_from_slice(&data),
                                Token::Match => body_prefix.extend_from_slice(CRLF),
                            }
                        }
                        if let Some(residue) = self.line_search.end() {
                            body_prefix.extend_from_slice(&residue);
                        }
                        return Ok(Some((headers, body_prefix)));
                    } else {
                        self.lines.push(std::mem::take(&mut self.line));
                    }
                }
            }
        }
        Ok(None)
    }
}

/// ボディ転送と境界直前 CRLF の除去
///
/// CRLF をニードルとする内側のスキャナでボディを濾し、CRLF を 1 トークン
/// 分だけ遅延させて転送する。境界一致が来た時点で保留中の CRLF は RFC が
/// 境界の前に要求するトレーラなので捨てる。
#[derive(Debug, Clone)]
struct BodyReader {
    crlf: StreamSearch,
    pending_crlf: bool,
}

impl BodyReader {
    fn new() -> Self {
        BodyReader {
            crlf: StreamSearch::new(CRLF),
            pending_crlf: false,
        }
    }

    fn feed(&mut self, data: &[u8], events: &mut Vec<PartEvent>) {
        for token in self.crlf.feed(data) {
            match token {
                Token::Data(data) => {
                    if self.pending_crlf {
                        self.pending_crlf = false;
                        events.push(PartEvent::BodyChunk(CRLF.to_vec()));
                    }
                    events.push(PartEvent::BodyChunk(data));
                }
                Token::Match => {
                    if self.pending_crlf {
                        events.push(PartEvent::BodyChunk(CRLF.to_vec()));
                    }
                    self.pending_crlf = true;
                }
            }
        }
    }

    fn finish(&mut self, events: &mut Vec<PartEvent>) {
        self.pending_crlf = false;
        if let Some(residue) = self.crlf.end() {
            events.push(PartEvent::BodyChunk(residue));
        }
    }
}

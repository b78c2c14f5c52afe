//! 非同期ストリーム検索
//!
//! バイトソースと [`StreamSearch`] を束ね、トークン列あるいは一致で
//! 区切られたセグメント列として読む。

use std::collections::VecDeque;

use shiguredo_multipart::bytes::merge;
use shiguredo_multipart::{StreamSearch, Token};

use crate::error::{Error, Result};
use crate::source::ByteSource;

/// バイトソースをニードルで分割して読むアダプタ
///
/// ソースの終端ではスキャナの残余が最後の [`Token::Data`] として流れる。
#[derive(Debug)]
pub struct SearchStream<S> {
    source: S,
    search: StreamSearch,
    tokens: VecDeque<Token>,
    source_eof: bool,
    segments_done: bool,
}

impl<S: ByteSource> SearchStream<S> {
    /// 新しいアダプタを作成
    pub fn new(source: S, needle: &[u8]) -> Self {
        SearchStream {
            source,
            search: StreamSearch::new(needle),
            tokens: VecDeque::new(),
            source_eof: false,
            segments_done: false,
        }
    }

    /// 次のトークンを取得する。ストリームの終端で `None`。
    pub async fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            if let Some(token) = self.tokens.pop_front() {
                return Ok(Some(token));
            }
            if self.source_eof {
                return Ok(None);
            }
            match self.source.next_chunk().await.map_err(Error::Source)? {
                Some(chunk) => self.tokens.extend(self.search.feed(&chunk)),
                None => {
                    self.source_eof = true;
                    if let Some(residue) = self.search.end() {
                        self.tokens.push_back(Token::Data(residue));
                    }
                }
            }
        }
    }

    /// 一致で区切られた次のセグメントを取得する
    ///
    /// 一致ごとに 1 セグメント、さらに最後の一致から終端までの 1 セグメント
    /// (空でもよい) を返す。プロローグとエピローグも含まれる。
    pub async fn next_segment(&mut self) -> Result<Option<Vec<u8>>> {
        if self.segments_done {
            return Ok(None);
        }
        let mut segment = Vec::new();
        loop {
            match self.next_token().await? {
                Some(Token::Data(data)) => segment.push(data),
                Some(Token::Match) => return Ok(Some(merge(&segment))),
                None => {
                    self.segments_done = true;
                    return Ok(Some(merge(&segment)));
                }
            }
        }
    }
}

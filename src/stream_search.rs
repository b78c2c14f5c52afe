//! ストリーミングバイト列検索 (Boyer-Moore-Horspool)
//!
//! ## 概要
//!
//! 任意の大きさに分割されたバイトストリームを、リテラルのニードルで分割する
//! ストリーミングスキャナを提供します。チャンク境界をまたぐ一致を見逃さない
//! よう、直前のデータの接尾辞をルックビハインドとして保持します。不一致が
//! 確定したバイトは可能な限り早く [`Token::Data`] として払い出されます。
//!
//! ## 使い方
//!
//! ```rust
//! use shiguredo_multipart::{StreamSearch, Token};
//!
//! let mut search = StreamSearch::new(b"--bnd");
//!
//! // ニードルがチャンク境界をまたいでも検出できる
//! let mut tokens = search.feed(b"hello--b");
//! tokens.extend(search.feed(b"nd world"));
//! tokens.extend(search.end().map(Token::Data));
//!
//! assert_eq!(tokens, vec![
//!     Token::Data(b"hello".to_vec()),
//!     Token::Match,
//!     Token::Data(b" world".to_vec()),
//! ]);
//! ```

/// スキャナが払い出すトークン
///
/// ストリームの全バイトは、いずれかの `Data`、消費済みの `Match`、または
/// ルックビハインドのいずれかにちょうど 1 回ずつ割り当てられる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// ニードルを含まない非空のバイト列
    Data(Vec<u8>),
    /// ニードルの出現 (ニードル自体のバイトは消費され報告されない)
    Match,
}

/// ストリーミング BMH スキャナ
///
/// `feed` は同期かつ決定的で、I/O を行わない。ルックビハインドの長さは
/// 常にニードル長未満に収まる。
#[derive(Debug, Clone)]
pub struct StreamSearch {
    /// 検索対象のニードル (長さ 1 以上)
    needle: Vec<u8>,
    /// BMH の出現テーブル
    occurrence: [usize; 256],
    /// 次のチャンクに続く可能性のある接尾辞
    lookbehind: Vec<u8>,
}

/// ルックビハインドをまたぐスキャンの結果
enum Straddle {
    /// チャンク全体がルックビハインドに取り込まれた
    Consumed,
    /// 一致を消費した。チャンク内の指定位置から走査を再開する
    Resume(usize),
    /// ルックビハインドは不一致確定。チャンク先頭からが未出力領域
    Scan(usize),
}

impl StreamSearch {
    /// 新しいスキャナを作成
    ///
    /// ニードルは 1 バイト以上でなければならない。
    pub fn new(needle: &[u8]) -> Self {
        assert!(!needle.is_empty(), "needle must not be empty");

        // occurrence[c] = 末尾を除く最後の c の位置から求めたシフト量
        let mut occurrence = [needle.len(); 256];
        for (i, &b) in needle[..needle.len() - 1].iter().enumerate() {
            occurrence[b as usize] = needle.len() - 1 - i;
        }

        StreamSearch {
            needle: needle.to_vec(),
            occurrence,
            lookbehind: Vec::new(),
        }
    }

    /// ニードルを取得
    pub fn needle(&self) -> &[u8] {
        &self.needle
    }

    /// 現在のルックビハインドを取得
    pub fn lookbehind(&self) -> &[u8] {
        &self.lookbehind
    }

    /// チャンクを追加し、確定したトークン列を返す
    ///
    /// 空のチャンクを与えても状態は変化しない。
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Token> {
        let mut tokens = Vec::new();

        let start = if self.lookbehind.is_empty() {
            0
        } else {
            match self.straddle(chunk, &mut tokens) {
                Straddle::Consumed => return tokens,
                Straddle::Resume(resume) => {
                    self.scan_chunk(chunk, resume, resume, &mut tokens);
                    return tokens;
                }
                Straddle::Scan(scan) => scan,
            }
        };
        self.scan_chunk(chunk, start, 0, &mut tokens);
        tokens
    }

    /// 残っているルックビハインドを払い出して空にする
    ///
    /// 入力の終端で呼ぶ。戻り値が `Some` ならストリーム最後のデータとして
    /// 扱う。
    pub fn end(&mut self) -> Option<Vec<u8>> {
        if self.lookbehind.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.lookbehind))
        }
    }

    /// ルックビハインド + チャンクの連結上の位置 `pos` のバイトを取得
    ///
    /// 負の位置はルックビハインド領域 (`-k` は末尾から k バイト目)。
    fn at(&self, chunk: &[u8], pos: isize) -> u8 {
        if pos < 0 {
            self.lookbehind[(self.lookbehind.len() as isize + pos) as usize]
        } else {
            chunk[pos as usize]
        }
    }

    /// 位置 `pos` からニードルの先頭 `len` バイトが一致するか
    fn matches_prefix(&self, chunk: &[u8], pos: isize, len: usize) -> bool {
        (0..len).all(|i| self.at(chunk, pos + i as isize) == self.needle[i])
    }

    /// 照合ウィンドウがルックビハインドとチャンクにまたがる間のスキャン
    fn straddle(&mut self, chunk: &[u8], tokens: &mut Vec<Token>) -> Straddle {
        let needle_len = self.needle.len() as isize;
        let chunk_len = chunk.len() as isize;
        let mut pos = -(self.lookbehind.len() as isize);

        // BMH ステップ (ウィンドウ末尾がチャンク内に収まる間)
        while pos < 0 && pos <= chunk_len - needle_len {
            let last = self.at(chunk, pos + needle_len - 1);
            if last == self.needle[self.needle.len() - 1]
                && self.matches_prefix(chunk, pos, self.needle.len() - 1)
            {
                let keep = (self.lookbehind.len() as isize + pos) as usize;
                if keep > 0 {
                    tokens.push(Token::Data(self.lookbehind[..keep].to_vec()));
                }
                tokens.push(Token::Match);
                self.lookbehind.clear();
                return Straddle::Resume((pos + needle_len) as usize);
            }
            pos += self.occurrence[last as usize] as isize;
        }

        if pos >= 0 {
            // シフトがルックビハインドを追い越した: 全体が不一致確定
            let lookbehind = std::mem::take(&mut self.lookbehind);
            tokens.push(Token::Data(lookbehind));
            return Straddle::Scan(pos as usize);
        }

        // 残りがニードル長に満たない: 将来の一致を始め得る位置を 1 バイトずつ探す
        while pos < 0 {
            let tail_len = (chunk_len - pos) as usize;
            if self.matches_prefix(chunk, pos, tail_len) {
                let keep = (self.lookbehind.len() as isize + pos) as usize;
                if keep > 0 {
                    tokens.push(Token::Data(self.lookbehind[..keep].to_vec()));
                }
                let mut next = self.lookbehind[keep..].to_vec();
                next.extend_from_slice(chunk);
                self.lookbehind = next;
                return Straddle::Consumed;
            }
            pos += 1;
        }

        let lookbehind = std::mem::take(&mut self.lookbehind);
        tokens.push(Token::Data(lookbehind));
        Straddle::Scan(0)
    }

    /// チャンク内の古典的 BMH スキャン
    ///
    /// `pending` はまだ出力されていない領域の先頭。末尾のニードル長未満の
    /// 領域は、将来の一致を始め得る最初の位置から後ろを新しいルックビハインド
    /// とする。
    fn scan_chunk(&mut self, chunk: &[u8], start: usize, pending: usize, tokens: &mut Vec<Token>) {
        let needle_len = self.needle.len();
        let mut pos = start;
        let mut pending = pending;

        while pos + needle_len <= chunk.len() {
            let last = chunk[pos + needle_len - 1];
            if last == self.needle[needle_len - 1]
                && chunk[pos] == self.needle[0]
                && (needle_len < 2
                    || chunk[pos + 1..pos + needle_len - 1] == self.needle[1..needle_len - 1])
            {
                if pos > pending {
                    tokens.push(Token::Data(chunk[pending..pos].to_vec()));
                }
                tokens.push(Token::Match);
                pos += needle_len;
                pending = pos;
            } else {
                pos += self.occurrence[last as usize];
            }
        }

        while pos < chunk.len() {
            if chunk[pos] == self.needle[0] && chunk[pos..] == self.needle[..chunk.len() - pos] {
                break;
            }
            pos += 1;
        }

        if pos > pending {
            tokens.push(Token::Data(chunk[pending..pos].to_vec()));
        }
        self.lookbehind = chunk[pos..].to_vec();
    }
}

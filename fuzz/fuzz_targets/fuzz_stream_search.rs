#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_multipart::{StreamSearch, Token};

#[derive(Debug, Arbitrary)]
struct Input {
    needle: Vec<u8>,
    chunks: Vec<Vec<u8>>,
}

fuzz_target!(|input: Input| {
    if input.needle.is_empty() || input.needle.len() > 64 {
        return;
    }

    let mut search = StreamSearch::new(&input.needle);
    let mut data_total = 0usize;
    let mut matches = 0usize;
    let mut fed = 0usize;

    for chunk in &input.chunks {
        fed += chunk.len();
        for token in search.feed(chunk) {
            match token {
                Token::Data(data) => {
                    // Data トークンは非空で、ニードルを含まない
                    assert!(!data.is_empty());
                    assert!(!data
                        .windows(input.needle.len())
                        .any(|w| w == input.needle.as_slice()));
                    data_total += data.len();
                }
                Token::Match => matches += 1,
            }
        }
        // ルックビハインドはニードル長未満
        assert!(search.lookbehind().len() < input.needle.len());
    }

    // バイト保存則
    let residue = search.end().map_or(0, |r| r.len());
    assert_eq!(data_total + matches * input.needle.len() + residue, fed);
});

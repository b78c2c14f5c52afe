//! チャンク分割網羅テスト
//!
//! ストリーミングパーサーの核となる性質は「チャンクの分割位置が観測結果に
//! 一切影響しない」こと。PBT (pbt/) はランダムなペイロードとランダムな
//! 分割サイズでこの性質を検証するが、境界一致がチャンクをまたぐ位置は
//! 確率的にしか踏まれない。
//!
//! このテストは固定のシナリオペイロードに対して分割サイズを 1 から
//! ペイロード長まで全網羅する。これにより、境界・ヘッダー終端・ボディ末尾
//! CRLF のそれぞれがどの位置で分断されるケースも必ず 1 回は通る。
//! ルックビハインドの持ち越し、境界直後の閉じデリミタ判定 (`--` が 1 バイト
//! ずつ届くケース)、保留 CRLF の払い出しといった状態遷移の取りこぼしは、
//! ランダムテストよりこの網羅で検出しやすい。

use shiguredo_multipart::{MultipartBuilder, MultipartParser, Part, PartEvent, PartHeaders};

/// ペイロードを chunk_size ごとに feed して全パートを収集する
fn parse_in_chunks(boundary: &str, payload: &[u8], chunk_size: usize) -> Vec<Part> {
    let mut parser = MultipartParser::new(boundary);
    let mut events = Vec::new();
    for chunk in payload.chunks(chunk_size) {
        events.extend(parser.feed(chunk).unwrap());
    }
    events.extend(parser.finish().unwrap());

    let mut parts = Vec::new();
    let mut current: Option<(shiguredo_multipart::PartHeaders, Vec<u8>)> = None;
    for event in events {
        match event {
            PartEvent::Headers(headers) => current = Some((headers, Vec::new())),
            PartEvent::BodyChunk(chunk) => current.as_mut().unwrap().1.extend(chunk),
            PartEvent::PartEnd => {
                let (headers, body) = current.take().unwrap();
                parts.push(Part::from_parts(headers, body));
            }
            PartEvent::Finished => break,
        }
    }
    parts
}

/// 全分割サイズで whole-payload と同じ結果になることを確認する
fn assert_chunking_invariant(boundary: &str, payload: &[u8]) {
    let whole = parse_in_chunks(boundary, payload, payload.len());
    for chunk_size in 1..payload.len() {
        let chunked = parse_in_chunks(boundary, payload, chunk_size);
        assert_eq!(chunked, whole, "chunk size {}", chunk_size);
    }
}

/// 単一テキストフィールド
#[test]
fn single_text_field_all_chunkings() {
    let payload = b"\r\n--bnd\r\n\
        Content-Disposition: form-data; name=\"a\"\r\n\r\n\
        form value a\r\n\
        --bnd--";

    let whole = parse_in_chunks("bnd", payload, payload.len());
    assert_eq!(whole.len(), 1);
    assert_eq!(whole[0].name(), "a");
    assert_eq!(whole[0].filename(), None);
    assert_eq!(whole[0].content_type(), None);
    assert_eq!(whole[0].body(), b"form value a");

    assert_chunking_invariant("bnd", payload);
}

/// テキスト + ファイル混在、空白入り境界、ボディ内 CRLF
#[test]
fn mixed_fields_all_chunkings() {
    let boundary = "some random boundary";
    let payload = MultipartBuilder::with_boundary(boundary)
        .text_field("a", "form value a")
        .part(Part::from_parts(
            PartHeaders::new("b").with_filename("b.txt"),
            b"file value b".to_vec(),
        ))
        .file_field(
            "c",
            "c.txt",
            "text/plain",
            b"file value c\r\nhas\r\nsome new \r\n lines",
        )
        .file_field("d", "d=.txt", "text/plain", b"weird title")
        .build();

    let whole = parse_in_chunks(boundary, &payload, payload.len());
    assert_eq!(whole.len(), 4);
    assert_eq!(whole[0].name(), "a");
    assert_eq!(whole[0].body(), b"form value a");
    assert_eq!(whole[1].filename(), Some("b.txt"));
    assert_eq!(whole[1].content_type(), None);
    assert_eq!(whole[1].body(), b"file value b");
    assert_eq!(whole[2].content_type(), Some("text/plain"));
    assert_eq!(whole[2].body(), b"file value c\r\nhas\r\nsome new \r\n lines");
    assert_eq!(whole[3].filename(), Some("d=.txt"));
    assert_eq!(whole[3].body(), b"weird title");

    assert_chunking_invariant(boundary, &payload);
}

/// 各チャンクが境界の接頭辞 `\r\n--bn` で終わる分割
#[test]
fn needle_prefix_at_every_chunk_end() {
    let boundary = "bnd";
    // ボディに接頭辞を散りばめ、さらに全分割サイズで網羅する
    let payload = b"--bnd\r\n\
        Content-Disposition: form-data; name=\"x\"\r\n\r\n\
        one\r\n--bn two\r\n--bn three\r\n\
        --bnd--";

    let whole = parse_in_chunks(boundary, payload, payload.len());
    assert_eq!(whole[0].body(), b"one\r\n--bn two\r\n--bn three");

    assert_chunking_invariant(boundary, payload);

    // 明示的に `\r\n--bn` 区切りで投入する
    let mut parser = MultipartParser::new(boundary);
    let mut events = Vec::new();
    let splits: &[&[u8]] = &[
        b"--bnd\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\none\r\n--bn",
        b" two\r\n--bn",
        b" three\r\n--bn",
        b"d--",
    ];
    for chunk in splits {
        events.extend(parser.feed(chunk).unwrap());
    }
    events.extend(parser.finish().unwrap());
    let body: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            PartEvent::BodyChunk(c) => Some(c.clone()),
            _ => None,
        })
        .flatten()
        .collect();
    assert_eq!(body, b"one\r\n--bn two\r\n--bn three");
}

/// プロローグとエピローグは観測されない
#[test]
fn prologue_and_epilogue_all_chunkings() {
    let payload = b"preamble bytes\r\n\
        --bnd\r\n\
        Content-Disposition: form-data; name=\"a\"\r\n\r\n\
        value\r\n\
        --bnd--\r\nepilogue bytes";

    let whole = parse_in_chunks("bnd", payload, payload.len());
    assert_eq!(whole.len(), 1);
    assert_eq!(whole[0].body(), b"value");

    assert_chunking_invariant("bnd", payload);
}

/// ラウンドトリップ: パース -> 再シリアライズ -> 再パース
#[test]
fn roundtrip_preserves_descriptors() {
    let boundary = "roundtrip";
    let payload = MultipartBuilder::with_boundary(boundary)
        .text_field("a", "1")
        .file_field("b", "b.bin", "application/octet-stream", b"\x00\x01\x02")
        .build();

    let parts = MultipartParser::parse(boundary, &payload).unwrap();

    let mut builder = MultipartBuilder::with_boundary(boundary);
    for part in &parts {
        builder = builder.part(part.clone());
    }
    let reparsed = MultipartParser::parse(boundary, &builder.build()).unwrap();
    assert_eq!(reparsed, parts);
}

//! multipart パーサーのプロパティテスト

use pbt::{split_into_chunks, valid_boundary, valid_field_name, valid_filename, valid_mime_type, valid_text_value};
use proptest::prelude::*;
use shiguredo_multipart::{MultipartBuilder, MultipartParser, Part};

// チャンク分割して流し、全パートを収集する
fn parse_chunked(boundary: &str, payload: &[u8], chunk_size: usize) -> Vec<Part> {
    let mut parser = MultipartParser::new(boundary);
    let mut events = Vec::new();
    for chunk in split_into_chunks(payload, chunk_size) {
        events.extend(parser.feed(&chunk).unwrap());
    }
    events.extend(parser.finish().unwrap());

    let mut parts = Vec::new();
    let mut current: Option<(shiguredo_multipart::PartHeaders, Vec<u8>)> = None;
    for event in events {
        match event {
            shiguredo_multipart::PartEvent::Headers(h) => current = Some((h, Vec::new())),
            shiguredo_multipart::PartEvent::BodyChunk(c) => {
                current.as_mut().unwrap().1.extend(c);
            }
            shiguredo_multipart::PartEvent::PartEnd => {
                let (h, b) = current.take().unwrap();
                parts.push(Part::from_parts(h, b));
            }
            shiguredo_multipart::PartEvent::Finished => break,
        }
    }
    parts
}

// テキストフィールドのラウンドトリップ
proptest! {
    #[test]
    fn multipart_text_field_roundtrip(name in valid_field_name(), value in valid_text_value()) {
        let body = MultipartBuilder::with_boundary("test-boundary")
            .text_field(&name, &value)
            .build();

        let parts = MultipartParser::parse("test-boundary", &body).unwrap();
        prop_assert_eq!(parts.len(), 1);
        prop_assert_eq!(parts[0].name(), name.as_str());
        prop_assert_eq!(parts[0].body(), value.as_bytes());
        prop_assert!(!parts[0].is_file());
    }
}

// ファイルフィールドのラウンドトリップ (バイナリボディ)
proptest! {
    #[test]
    fn multipart_file_field_roundtrip(
        name in valid_field_name(),
        filename in valid_filename(),
        mime_type in valid_mime_type(),
        data in proptest::collection::vec(any::<u8>(), 0..64)
    ) {
        // 境界文字列がボディに現れないようにする
        prop_assume!(!data.windows(10).any(|w| w == b"--file-bnd"));

        let body = MultipartBuilder::with_boundary("file-bnd")
            .file_field(&name, &filename, &mime_type, &data)
            .build();

        let parts = MultipartParser::parse("file-bnd", &body).unwrap();
        prop_assert_eq!(parts.len(), 1);
        prop_assert_eq!(parts[0].name(), name.as_str());
        prop_assert_eq!(parts[0].filename(), Some(filename.as_str()));
        prop_assert_eq!(parts[0].content_type(), Some(mime_type.as_str()));
        prop_assert_eq!(parts[0].body(), data.as_slice());
    }
}

// チャンク分割位置はパース結果に影響しない
proptest! {
    #[test]
    fn multipart_chunking_invariant(
        boundary in valid_boundary(),
        name1 in valid_field_name(),
        value1 in valid_text_value(),
        name2 in valid_field_name(),
        filename in valid_filename(),
        data in proptest::collection::vec(any::<u8>(), 0..48),
        chunk_size in 1usize..40,
    ) {
        prop_assume!(!data.windows(boundary.len() + 2).any(|w| w[2..] == *boundary.as_bytes() && &w[..2] == b"--"));

        let payload = MultipartBuilder::with_boundary(&boundary)
            .text_field(&name1, &value1)
            .file_field(&name2, &filename, "application/octet-stream", &data)
            .build();

        let whole = parse_chunked(&boundary, &payload, 0);
        prop_assert_eq!(&parse_chunked(&boundary, &payload, 1), &whole);
        prop_assert_eq!(&parse_chunked(&boundary, &payload, 3), &whole);
        prop_assert_eq!(&parse_chunked(&boundary, &payload, chunk_size), &whole);

        prop_assert_eq!(whole.len(), 2);
        prop_assert_eq!(whole[1].body(), data.as_slice());
    }
}

// 複数フィールド
proptest! {
    #[test]
    fn multipart_multiple_fields_roundtrip(
        name1 in valid_field_name(),
        value1 in valid_text_value(),
        name2 in valid_field_name(),
        value2 in valid_text_value()
    ) {
        let body = MultipartBuilder::with_boundary("boundary")
            .text_field(&name1, &value1)
            .text_field(&name2, &value2)
            .build();

        let parts = MultipartParser::parse("boundary", &body).unwrap();
        prop_assert_eq!(parts.len(), 2);
        prop_assert_eq!(parts[0].name(), name1.as_str());
        prop_assert_eq!(parts[0].body(), value1.as_bytes());
        prop_assert_eq!(parts[1].name(), name2.as_str());
        prop_assert_eq!(parts[1].body(), value2.as_bytes());
    }
}

// 空のフィールドと空のファイル
proptest! {
    #[test]
    fn multipart_empty_value_roundtrip(name in valid_field_name(), filename in valid_filename()) {
        let body = MultipartBuilder::with_boundary("boundary")
            .text_field(&name, "")
            .file_field(&name, &filename, "application/octet-stream", &[])
            .build();

        let parts = MultipartParser::parse("boundary", &body).unwrap();
        prop_assert_eq!(parts.len(), 2);
        prop_assert_eq!(parts[0].body(), b"");
        prop_assert_eq!(parts[1].body(), b"");
    }
}

// 任意のバイト列でパニックしない
proptest! {
    #[test]
    fn multipart_parse_no_panic(data in proptest::collection::vec(any::<u8>(), 0..128)) {
        // エラーは正常系
        let _ = MultipartParser::parse("boundary", &data);
    }
}

// 任意のバイト列を任意に分割してもパニックしない
proptest! {
    #[test]
    fn multipart_chunked_feed_no_panic(
        data in proptest::collection::vec(any::<u8>(), 0..128),
        chunk_size in 1usize..16,
    ) {
        let mut parser = MultipartParser::new("boundary");
        for chunk in split_into_chunks(&data, chunk_size) {
            if parser.feed(&chunk).is_err() {
                return Ok(());
            }
        }
        let _ = parser.finish();
    }
}

// 任意の境界でパニックしない
proptest! {
    #[test]
    fn multipart_any_boundary_no_panic(boundary in "[ -~]{1,64}") {
        let mut parser = MultipartParser::new(&boundary);
        let _ = parser.feed(
            b"--test\r\nContent-Disposition: form-data; name=\"f\"\r\n\r\nval\r\n--test--",
        );
        let _ = parser.finish();
    }
}

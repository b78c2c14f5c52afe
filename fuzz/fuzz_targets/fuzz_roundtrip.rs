#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_multipart::{MultipartBuilder, MultipartParser};

fuzz_target!(|data: &[u8]| {
    // パースできた入力は、再シリアライズして再パースしても
    // 同じ記述子列になる
    let boundary = "fuzz-boundary";
    let Ok(parts) = MultipartParser::parse(boundary, data) else {
        return;
    };

    let mut builder = MultipartBuilder::with_boundary(boundary);
    for part in &parts {
        builder = builder.part(part.clone());
    }
    let rebuilt = builder.build();

    let reparsed = MultipartParser::parse(boundary, &rebuilt)
        .expect("re-serialized multipart must reparse");
    assert_eq!(reparsed, parts);
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_multipart::MultipartParser;

fuzz_target!(|data: &[u8]| {
    // 様々な境界でパースを試行
    let boundaries = ["boundary", "----WebKitFormBoundary", "abc123", "-"];

    for boundary in boundaries {
        // 一括
        if let Ok(parts) = MultipartParser::parse(boundary, data) {
            for part in &parts {
                let _ = part.name();
                let _ = part.filename();
                let _ = part.content_type();
                let _ = part.body();
                let _ = part.body_str();
                let _ = part.is_file();
            }
        }

        // 3 バイトずつのチャンク投入 (パニックしなければ OK)
        let mut parser = MultipartParser::new(boundary);
        for chunk in data.chunks(3) {
            if parser.feed(chunk).is_err() {
                break;
            }
        }
        let _ = parser.finish();
    }
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_multipart::ContentDisposition;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(cd) = ContentDisposition::parse(input) {
        // パースできた値は再シリアライズして再パースできる
        let serialized = cd.to_string();
        let reparsed = ContentDisposition::parse(&serialized)
            .expect("serialized content-disposition must reparse");
        assert_eq!(reparsed.name(), cd.name());
        assert_eq!(reparsed.filename(), cd.filename());
    }
});

//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// multipart/form-data 用データ生成
// ========================================

/// 境界文字列に使う bchars (RFC 2046 §5.1.1 の部分集合)
const BOUNDARY_CHARS: &[char] = &[
    'a', 'c', 'e', 'g', 'k', 'm', 'p', 'r', 'w', 'z', '0', '1', '4', '7', '9', '-', '_',
];

/// フィールド名 (RFC 7578 §4.2)
///
/// 先頭は英小文字、以降は引用もエスケープも要らない文字だけを続ける。
pub fn valid_field_name() -> impl Strategy<Value = String> {
    ("[a-z]{1,4}", "[A-Za-z0-9_]{0,12}").prop_map(|(head, tail)| head + &tail)
}

/// 拡張子付きのファイル名
pub fn valid_filename() -> impl Strategy<Value = String> {
    let extension = prop_oneof![Just("txt"), Just("bin"), Just("png"), Just("ts")];
    ("[A-Za-z0-9][A-Za-z0-9_-]{0,11}", extension)
        .prop_map(|(stem, extension)| format!("{}.{}", stem, extension))
}

/// テキストフィールドの値 (CRLF を含まない語の列)
pub fn valid_text_value() -> impl Strategy<Value = String> {
    proptest::collection::vec("[A-Za-z0-9,.!?]{1,8}", 0..8).prop_map(|words| words.join(" "))
}

/// 境界文字列 (RFC 2046: 1-70 バイト、末尾空白なし)
pub fn valid_boundary() -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::sample::select(BOUNDARY_CHARS), 6..40).prop_map(
        |mut chars| {
            // 末尾の '-' や '_' は英数字に置き換えて bchars の末尾条件を守る
            if let Some(last) = chars.last_mut() {
                if !last.is_ascii_alphanumeric() {
                    *last = 'q';
                }
            }
            chars.into_iter().collect()
        },
    )
}

/// 代表的な MIME タイプ
pub fn valid_mime_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(("text", "plain")),
        Just(("text", "html")),
        Just(("image", "png")),
        Just(("application", "json")),
        Just(("application", "octet-stream")),
    ]
    .prop_map(|(kind, subtype)| format!("{}/{}", kind, subtype))
}

// ========================================
// チャンク分割
// ========================================

/// ペイロードを指定サイズで分割する (0 は全量 1 チャンク)
pub fn split_into_chunks(payload: &[u8], chunk_size: usize) -> Vec<Vec<u8>> {
    if payload.is_empty() {
        return Vec::new();
    }
    if chunk_size == 0 {
        return vec![payload.to_vec()];
    }
    payload.chunks(chunk_size).map(|c| c.to_vec()).collect()
}

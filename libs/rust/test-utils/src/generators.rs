//! Shared proptest generators.

use proptest::prelude::*;

/// Non-empty catalog ids.
pub fn book_id_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}"
}

/// Ids including the empty string, which the catalog rejects.
pub fn maybe_empty_book_id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        1 => Just(String::new()),
        4 => book_id_strategy(),
    ]
}

/// Human-ish titles.
pub fn title_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10}( [A-Z][a-z]{2,10}){0,3}"
}

/// Author names.
pub fn author_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,8} [A-Z][a-z]{2,10}"
}

/// `(id, title, author)` triples with non-empty ids.
pub fn book_strategy() -> impl Strategy<Value = (String, String, String)> {
    (book_id_strategy(), title_strategy(), author_strategy())
}

/// Valid usernames.
pub fn username_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{2,15}"
}

/// Non-empty passwords of printable ASCII.
pub fn password_strategy() -> impl Strategy<Value = String> {
    "[ -~]{1,24}"
}

/// HMAC secrets.
pub fn secret_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 16..64)
}

/// Raw `(page, page_size)` inputs, including zero and negative values.
pub fn page_request_strategy() -> impl Strategy<Value = (i32, i32)> {
    (-3i32..6, -3i32..15)
}

//! Path splitting and case folding used by the store.
//!
//! A path is a sequence of name segments separated by `\` or `/`. Empty
//! segments are ignored, so `A//B/` and `\A\B` both name `A` then `B`.

/// Returns `true` for the characters that separate path segments.
pub fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Iterate the non-empty segments of a path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(is_separator).filter(|s| !s.is_empty())
}

/// Key under which a name is matched. Comparison is case-insensitive.
pub fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// Length of a name in UTF-16 code units, the unit all name bounds use.
pub fn utf16_len(name: &str) -> usize {
    name.encode_utf16().count()
}

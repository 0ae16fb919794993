//! Canonicalization of raw column headers into stable lookup tokens

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a raw column header into a stable lookup token.
///
/// Decomposes Unicode, strips diacritic marks, replaces runs of
/// non-alphanumeric characters with a single underscore, trims leading
/// and trailing underscores, and lowercases. Total and pure:
/// `"Descripción"`, `"descripcion"` and `"DESCRIPCION"` all normalize
/// to `"descripcion"`.
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for c in raw.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    out
}

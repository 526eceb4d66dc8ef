//! Small string helpers shared by rendering and dispatch.

/// Marker appended to text cut by [`truncate`].
pub const ELLIPSIS: char = '…';

/// Cut `value` to at most `max_chars` characters, appending [`ELLIPSIS`]
/// when anything was removed.
pub fn truncate(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        None => value.to_string(),
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + ELLIPSIS.len_utf8());
            out.push_str(&value[..cut]);
            out.push(ELLIPSIS);
            out
        }
    }
}

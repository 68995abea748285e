//! Output truncation before text is sent to the oracle.

/// Return at most `max_chars` Unicode scalar values from the start of `text`.
///
/// Never splits a multi-byte sequence. Borrows when no truncation is needed.
pub fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

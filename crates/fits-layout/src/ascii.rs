//! Strict 7-bit ASCII conversion for header text.

use alloc::string::String;
use alloc::vec::Vec;

/// Convert `text` to its ASCII bytes, or `None` if any character is outside
/// the 7-bit range.
pub fn encode(text: &str) -> Option<Vec<u8>> {
    text.is_ascii().then(|| text.as_bytes().to_vec())
}

/// Convert ASCII bytes to a string, or `None` if any byte has its high bit set.
pub fn decode(buf: &[u8]) -> Option<String> {
    if !buf.is_ascii() {
        return None;
    }
    // 7-bit bytes are always valid UTF-8.
    String::from_utf8(buf.to_vec()).ok()
}

/// Convert `len` ASCII bytes of `buf` starting at `start` to a string.
///
/// Returns `None` when the range falls outside `buf` or contains a non-ASCII
/// byte.
pub fn decode_range(buf: &[u8], start: usize, len: usize) -> Option<String> {
    let end = start.checked_add(len)?;
    decode(buf.get(start..end)?)
}

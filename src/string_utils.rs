//! Char-indexed string helpers
//!
//! The styled buffer addresses text by character (Unicode scalar) index,
//! while `String` slicing works on UTF-8 byte offsets. These helpers convert
//! between the two and never panic on out-of-range indices.
//!
//! # Example
//! ```ignore
//! use crate::string_utils::{char_slice, char_to_byte};
//!
//! let text = "Hei på deg";
//! assert_eq!(char_to_byte(text, 6), 7); // 'å' is 2 bytes
//! assert_eq!(char_slice(text, 4, 6), "på");
//! ```

use std::ops::Range;

// ─────────────────────────────────────────────────────────────────────────────
// Index Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Number of characters in `s`.
#[inline]
pub fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the character at `char_index`.
///
/// Indices at or past the end map to `s.len()`.
pub fn char_to_byte(s: &str, char_index: usize) -> usize {
    s.char_indices()
        .nth(char_index)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}

/// Byte range covering the characters in `range`, clamped to the string.
pub fn char_range_to_bytes(s: &str, range: Range<usize>) -> Range<usize> {
    let start = char_to_byte(s, range.start);
    let end = char_to_byte(s, range.end.max(range.start));
    start..end
}

// ─────────────────────────────────────────────────────────────────────────────
// Slicing
// ─────────────────────────────────────────────────────────────────────────────

/// Slice by character indices. Out-of-range or inverted ranges yield `""`.
#[inline]
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    let bytes = char_range_to_bytes(s, start..end);
    &s[bytes]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_count_multibyte() {
        assert_eq!(char_count("Hei på deg"), 10);
        assert_eq!(char_count("你好"), 2);
        assert_eq!(char_count(""), 0);
    }

    #[test]
    fn test_char_to_byte() {
        let text = "Hei på deg";
        assert_eq!(char_to_byte(text, 0), 0);
        assert_eq!(char_to_byte(text, 5), 5);
        assert_eq!(char_to_byte(text, 6), 7);
        assert_eq!(char_to_byte(text, 10), text.len());
        assert_eq!(char_to_byte(text, 99), text.len());
    }

    #[test]
    fn test_char_slice_norwegian() {
        assert_eq!(char_slice("Hei på deg", 4, 6), "på");
    }

    #[test]
    fn test_char_slice_emoji_and_cjk() {
        let text = "Party 🎉 你好";
        assert_eq!(char_slice(text, 6, 7), "🎉");
        assert_eq!(char_slice(text, 8, 10), "你好");
    }

    #[test]
    fn test_char_slice_out_of_range() {
        assert_eq!(char_slice("abc", 2, 10), "c");
        assert_eq!(char_slice("abc", 5, 10), "");
        assert_eq!(char_slice("abc", 2, 1), "");
    }
}

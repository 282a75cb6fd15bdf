//! Text measurement helpers.
//!
//! Offsets in the engine are Unicode scalar values (chars). The DOM speaks
//! UTF-16 code units, so conversions live here where both sides can use them.

use std::ops::Range;

/// Number of chars in the first `utf16_offset` UTF-16 units of `text`.
///
/// Offsets past the end (or in the middle of a surrogate pair) round down
/// to the nearest char boundary.
pub fn utf16_to_char_offset(text: &str, utf16_offset: usize) -> usize {
    let mut utf16 = 0;
    for (chars, c) in text.chars().enumerate() {
        let next = utf16 + c.len_utf16();
        if next > utf16_offset {
            return chars;
        }
        utf16 = next;
    }
    text.chars().count()
}

/// Number of UTF-16 units in the first `char_offset` chars of `text`.
pub fn char_to_utf16_offset(text: &str, char_offset: usize) -> usize {
    text.chars().take(char_offset).map(char::len_utf16).sum()
}

/// Byte index of char offset `char_offset` in `text`, clamped to the end.
pub fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Count whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Describe the edit that turned `old` into `new` as a single replaced range.
///
/// Returns the char range in `old` that was replaced and the char length of
/// the replacement, found by trimming the common prefix and suffix. `None`
/// when the texts are identical.
pub fn diff_edit(old: &str, new: &str) -> Option<(Range<usize>, usize)> {
    if old == new {
        return None;
    }
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let prefix = old_chars
        .iter()
        .zip(&new_chars)
        .take_while(|(a, b)| a == b)
        .count();

    let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
    let suffix = old_chars
        .iter()
        .rev()
        .zip(new_chars.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let replaced = prefix..old_chars.len() - suffix;
    let inserted = new_chars.len() - suffix - prefix;
    Some((replaced, inserted))
}

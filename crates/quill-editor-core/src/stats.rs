use crate::text_helpers::count_words;

/// Counters shown next to the editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditorStats {
    pub chars: usize,
    pub words: usize,
    pub misspelled: usize,
}

impl EditorStats {
    pub fn measure(text: &str, misspelled: usize) -> Self {
        Self {
            chars: text.chars().count(),
            words: count_words(text),
            misspelled,
        }
    }
}

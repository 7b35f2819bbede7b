//! Character, word and sentence counts for the status line

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

use super::Fragment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub char_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
}

impl DocumentStats {
    /// Count over plain text
    pub fn from_text(text: &str) -> Self {
        Self {
            char_count: text.chars().count(),
            word_count: text.unicode_words().count(),
            sentence_count: text
                .split(['.', '!', '?'])
                .filter(|s| !s.trim().is_empty())
                .count(),
        }
    }

    /// Count over a fragment with its markup stripped
    pub fn from_fragment(fragment: &Fragment) -> Self {
        Self::from_text(&fragment.plain_text())
    }
}

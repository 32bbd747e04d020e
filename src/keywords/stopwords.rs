use std::collections::HashSet;

use stop_words::{LANGUAGE, get};

#[derive(Debug, Clone)]
pub struct StopWords(HashSet<String>);

impl StopWords {
    pub fn english() -> Self {
        StopWords(
            get(LANGUAGE::English)
                .iter()
                .map(|w| w.to_string().to_lowercase())
                .collect(),
        )
    }

    /// Expects an already lowercased word.
    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(word)
    }
}

use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Words credited to one participant, in the order they were found.
#[derive(Debug, Clone, Default)]
pub struct WordList {
    words: Vec<String>,
    seen: HashSet<String>,
}

impl WordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `word` (already normalized). Returns false if it was present.
    pub fn add(&mut self, word: &str) -> bool {
        if !self.seen.insert(word.to_string()) {
            return false;
        }
        self.words.push(word.to_string());
        true
    }

    pub fn contains(&self, word: &str) -> bool {
        self.seen.contains(word)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.words.clone()
    }
}

impl Serialize for WordList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.words.serialize(serializer)
    }
}

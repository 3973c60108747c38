use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

const RANDOM_WORD_ATTEMPTS: usize = 8;

#[derive(Default, Debug)]
pub struct TrieNode {
    children: HashMap<char, TrieNode>,
    is_end_of_word: bool,
}

/// Word membership over a fixed vocabulary.
///
/// Entries are stored lowercase. A dictionary that failed to load is simply
/// empty, so every lookup reports `false`.
#[derive(Default, Debug)]
pub struct Dictionary {
    root: TrieNode,
    by_length: BTreeMap<usize, Vec<String>>,
    len: usize,
}

pub enum SearchResult {
    ValidWord,   // Complete word in the vocabulary
    ValidPrefix, // Prefix of at least one longer word
    NotFound,    // No word starts this way
}

impl Dictionary {
    pub fn new(file_path: impl AsRef<Path>) -> io::Result<Self> {
        let mut dictionary = Dictionary::default();
        dictionary.load_from_file(file_path.as_ref())?;
        Ok(dictionary)
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = Dictionary::default();
        for word in words {
            if let Some(word) = Self::parse_line(word.as_ref()) {
                dictionary.insert(&word);
            }
        }
        dictionary
    }

    pub fn insert(&mut self, word: &str) {
        let mut node = &mut self.root;
        for ch in word.chars() {
            node = node.children.entry(ch).or_default();
        }
        if !node.is_end_of_word {
            node.is_end_of_word = true;
            self.len += 1;
            self.by_length
                .entry(word.chars().count())
                .or_default()
                .push(word.to_string());
        }
    }

    pub fn search(&self, word: &str) -> SearchResult {
        let mut node = &self.root;
        for ch in word.chars() {
            match node.children.get(&ch) {
                Some(n) => node = n,
                None => return SearchResult::NotFound,
            }
        }
        if node.is_end_of_word {
            SearchResult::ValidWord
        } else if node.children.is_empty() {
            SearchResult::NotFound
        } else {
            SearchResult::ValidPrefix
        }
    }

    /// Exact whole-word membership; `word` is expected in canonical lowercase.
    pub fn contains(&self, word: &str) -> bool {
        matches!(self.search(word), SearchResult::ValidWord)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Picks a random word whose length lies in `min_len..=max_len` and that
    /// `skip` does not reject. Returns `None` when nothing qualifies.
    pub fn random_word<R, F>(
        &self,
        rng: &mut R,
        min_len: usize,
        max_len: usize,
        skip: F,
    ) -> Option<&str>
    where
        R: Rng + ?Sized,
        F: Fn(&str) -> bool,
    {
        let buckets: Vec<&Vec<String>> = self
            .by_length
            .range(min_len..=max_len)
            .map(|(_, words)| words)
            .collect();
        for _ in 0..RANDOM_WORD_ATTEMPTS {
            let word = buckets.choose(rng)?.choose(rng)?;
            if !skip(word) {
                return Some(word.as_str());
            }
        }
        // mostly exhausted; scan what is left
        buckets
            .iter()
            .flat_map(|words| words.iter().map(String::as_str))
            .filter(|word| !skip(word))
            .choose(rng)
    }

    fn load_from_file(&mut self, path: &Path) -> io::Result<()> {
        let file = File::open(path)?;
        let reader = io::BufReader::new(file);

        for line in reader.lines() {
            let line = line?;
            if let Some(word) = Self::parse_line(&line) {
                self.insert(&word);
            }
        }
        Ok(())
    }

    // Accepts both plain word lists and "WORD<TAB>definition" lines.
    fn parse_line(line: &str) -> Option<String> {
        let word = line.split(['\t', ' ']).next()?.trim();
        if word.is_empty() || !word.chars().all(char::is_alphabetic) {
            return None;
        }
        Some(word.to_lowercase())
    }
}

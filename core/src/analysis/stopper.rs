use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::analysis::tokenizer::DEFAULT_STOPWORDS;
use crate::error::Result;

/// Set of stop-terms consulted at build time and when extracting vectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stopper {
    words: HashSet<String>,
}

impl Stopper {
    pub fn new() -> Self { Self::default() }

    /// Built-in English list.
    pub fn english() -> Self {
        Self::from_words(DEFAULT_STOPWORDS.iter().copied())
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Reads one word per line. Blank lines and `#` comments are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut words = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let word = line.trim();
            if word.is_empty() || word.starts_with('#') { continue; }
            words.push(word.to_string());
        }
        Ok(Self::from_words(words))
    }

    pub fn is_stop_word(&self, term: &str) -> bool { self.words.contains(term) }

    pub fn len(&self) -> usize { self.words.len() }

    pub fn is_empty(&self) -> bool { self.words.is_empty() }

    /// Sorted copy of the list, for persisting alongside an index.
    pub fn to_sorted_vec(&self) -> Vec<String> {
        let mut v: Vec<String> = self.words.iter().cloned().collect();
        v.sort();
        v
    }
}

//! Built-in processors.

use crate::analysis::tokenizer::{letter_runs, normalize, stem, words};
use crate::analysis::{Stopper, TextProcessor, Token};

/// Normalized word tokenization with stopping and optional English stemming.
/// Backs the `standard`, `english` and `stop` registrations.
#[derive(Debug)]
pub struct StandardProcessor {
    name: &'static str,
    stopper: Stopper,
    stemming: bool,
}

impl StandardProcessor {
    pub fn new(name: &'static str, stopper: Stopper, stemming: bool) -> Self {
        Self { name, stopper, stemming }
    }
}

impl TextProcessor for StandardProcessor {
    fn name(&self) -> &str { self.name }

    fn tokens(&self, text: &str) -> Vec<Token> {
        let normalized = normalize(text);
        words(&normalized)
            .enumerate()
            .map(|(pos, word)| {
                if self.stopper.is_stop_word(word) {
                    Token::stopped(word, pos)
                } else if self.stemming {
                    Token::new(stem(word), pos)
                } else {
                    Token::new(word, pos)
                }
            })
            .collect()
    }

    fn stopper(&self) -> Option<&Stopper> { Some(&self.stopper) }
}

/// Lowercased letter runs, no stopping.
#[derive(Debug, Default)]
pub struct SimpleProcessor;

impl TextProcessor for SimpleProcessor {
    fn name(&self) -> &str { "simple" }

    fn tokens(&self, text: &str) -> Vec<Token> {
        letter_runs(text).enumerate().map(|(pos, run)| Token::new(run.to_lowercase(), pos)).collect()
    }
}

/// Splits on whitespace and nothing else.
#[derive(Debug, Default)]
pub struct WhitespaceProcessor;

impl TextProcessor for WhitespaceProcessor {
    fn name(&self) -> &str { "whitespace" }

    fn tokens(&self, text: &str) -> Vec<Token> {
        text.split_whitespace().enumerate().map(|(pos, t)| Token::new(t, pos)).collect()
    }
}

/// The whole trimmed input is a single token.
#[derive(Debug, Default)]
pub struct KeywordProcessor;

impl TextProcessor for KeywordProcessor {
    fn name(&self) -> &str { "keyword" }

    fn tokens(&self, text: &str) -> Vec<Token> {
        let t = text.trim();
        if t.is_empty() { Vec::new() } else { vec![Token::new(t, 0)] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_marks_stopped_positions() {
        let p = StandardProcessor::new("standard", Stopper::english(), false);
        let toks = p.tokens("The cat and the hat");
        assert_eq!(toks.len(), 5);
        assert!(toks[0].stopped);
        assert_eq!(toks[1].term, "cat");
        assert_eq!(toks[1].position, 1);
        assert_eq!(p.terms("The cat and the hat"), vec!["cat", "hat"]);
    }

    #[test]
    fn english_stems_and_normalizes() {
        let p = StandardProcessor::new("english", Stopper::english(), true);
        let terms = p.terms("Running Runners RUN! The café's menu.");
        assert!(terms.contains(&"run".to_string()));
        assert!(terms.iter().any(|t| t.starts_with("caf")));
        assert!(!terms.contains(&"the".to_string()));
    }

    #[test]
    fn simple_whitespace_keyword() {
        assert_eq!(SimpleProcessor.terms("Hello, World42!"), vec!["hello", "world"]);
        assert_eq!(WhitespaceProcessor.terms("A b\tC"), vec!["A", "b", "C"]);
        assert_eq!(KeywordProcessor.terms("  New York  "), vec!["New York"]);
        assert!(KeywordProcessor.tokens("   ").is_empty());
    }
}

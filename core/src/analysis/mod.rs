//! Text processing: tokenizers, stop lists, the by-name processor registry and
//! the per-field dispatching wrapper.
//!
//! A processor turns text into a dense sequence of [`Token`]s. Stop-terms are
//! kept in the sequence with `stopped` set, so the index can record their
//! positions as OOV instead of shifting the remaining tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub mod per_field;
pub mod processors;
pub mod registry;
pub mod stopper;
pub mod tokenizer;

pub use per_field::PerFieldProcessor;
pub use registry::{registered_processors, resolve_processor, resolve_spec, DEFAULT_PROCESSOR};
pub use stopper::Stopper;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub term: String,
    /// 0-based, dense over every surface token of the input.
    pub position: u32,
    pub stopped: bool,
}

impl Token {
    pub fn new(term: impl Into<String>, position: usize) -> Self {
        Self { term: term.into(), position: position as u32, stopped: false }
    }

    pub fn stopped(term: impl Into<String>, position: usize) -> Self {
        Self { stopped: true, ..Self::new(term, position) }
    }
}

pub trait TextProcessor: Send + Sync + fmt::Debug {
    /// Registry name this processor was built under.
    fn name(&self) -> &str;

    /// Every surface token, stop-terms included (flagged).
    fn tokens(&self, text: &str) -> Vec<Token>;

    fn stopper(&self) -> Option<&Stopper> { None }

    /// Indexable terms in order, stop-terms removed.
    fn terms(&self, text: &str) -> Vec<String> {
        self.tokens(text).into_iter().filter(|t| !t.stopped).map(|t| t.term).collect()
    }

    fn is_stop_word(&self, term: &str) -> bool {
        self.stopper().map_or(false, |s| s.is_stop_word(term))
    }
}

/// What is needed to rebuild a processor: its name and, for processors built
/// from an external list, the list itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<Vec<String>>,
}

/// A processor together with the spec that produced it.
#[derive(Debug, Clone)]
pub struct ResolvedProcessor {
    pub spec: ProcessorSpec,
    pub processor: Arc<dyn TextProcessor>,
}

impl ResolvedProcessor {
    pub fn name(&self) -> &str { &self.spec.name }
}

impl std::ops::Deref for ResolvedProcessor {
    type Target = dyn TextProcessor;
    fn deref(&self) -> &Self::Target { self.processor.as_ref() }
}

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

/// A document as a corpus reader yields it: its external id plus raw field text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    pub docno: String,
    pub fields: BTreeMap<String, String>,
}

impl RawDocument {
    pub fn new(docno: impl Into<String>) -> Self {
        Self { docno: docno.into(), fields: BTreeMap::new() }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

pub type DocumentStream<'a> = Box<dyn Iterator<Item = Result<RawDocument>> + 'a>;

/// Source of raw documents for one corpus format.
pub trait CorpusReader {
    /// Lazily yields the documents under `root` in a stable order.
    fn documents<'a>(&'a self, root: &Path) -> Result<DocumentStream<'a>>;
}

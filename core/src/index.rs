use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::ProcessorSpec;
use crate::config::FieldSpec;

pub type TermId = u32;
pub type DocId = u32;

/// Sentinel stored at positions whose term the index did not keep.
pub const OOV: &str = "[OOV]";

/// Current on-disk metadata version.
pub const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocMeta {
    pub docno: String,
    /// Number of real (non-OOV) terms.
    pub length: u32,
    /// Values of stored fields, keyed by field name.
    #[serde(default)]
    pub stored: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
}

/// Per-term collection statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermStats {
    /// Documents containing the term.
    pub df: u32,
    /// Total occurrences across the collection.
    pub cf: u64,
}

/// Positional vector of one document. `stems[0]` is always [`OOV`]; each entry
/// of `positions` indexes into `stems`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocVector {
    pub stems: Vec<String>,
    pub positions: Vec<u32>,
}

impl Default for StoredDocVector {
    fn default() -> Self {
        Self { stems: vec![OOV.to_string()], positions: Vec::new() }
    }
}

impl StoredDocVector {
    /// Builds the stem table from a raw token sequence where `None` marks an
    /// OOV position.
    pub fn from_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut vector = StoredDocVector::default();
        let mut lookup: BTreeMap<&'a str, u32> = BTreeMap::new();
        for token in tokens {
            let idx = match token {
                None => 0,
                Some(term) => *lookup.entry(term).or_insert_with(|| {
                    vector.stems.push(term.to_string());
                    (vector.stems.len() - 1) as u32
                }),
            };
            vector.positions.push(idx);
        }
        vector
    }
}

/// Which engine persisted an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Directory of bincode files.
    #[default]
    Segment,
    /// sled database.
    Kv,
}

/// Contents of `meta.json`, written by every backend at finish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub backend: BackendKind,
    pub created_at: String,
    pub num_docs: u32,
    pub total_terms: u64,
    pub unique_terms: u64,
    pub scoring: String,
    pub default_processor: ProcessorSpec,
    #[serde(default)]
    pub field_processors: BTreeMap<String, ProcessorSpec>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl IndexMeta {
    pub fn doc_length_avg(&self) -> f64 {
        if self.num_docs == 0 { 0.0 } else { self.total_terms as f64 / self.num_docs as f64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tokens_shares_stem_slots() {
        let v = StoredDocVector::from_tokens([Some("a"), None, Some("b"), Some("a")]);
        assert_eq!(v.stems, vec![OOV, "a", "b"]);
        assert_eq!(v.positions, vec![1, 0, 2, 1]);
    }
}

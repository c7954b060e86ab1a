//! Turning a stored positional vector into token lists and feature vectors.
//!
//! Positions whose term was dropped at build time hold the [`OOV`] sentinel.
//! Every view here skips them while keeping the relative order of the real
//! tokens.

use std::collections::BTreeMap;

use crate::analysis::Stopper;
use crate::error::{Error, Result};
use crate::features::FeatureVector;
use crate::index::{DocId, StoredDocVector, OOV};

#[derive(Debug)]
pub struct DocumentVectorExtractor<'a> {
    doc_id: DocId,
    vector: &'a StoredDocVector,
}

impl<'a> DocumentVectorExtractor<'a> {
    /// Fails with [`Error::VectorRetrieval`] if a position points outside the
    /// stem table.
    pub fn new(doc_id: DocId, vector: &'a StoredDocVector) -> Result<Self> {
        let stems = vector.stems.len();
        if let Some(bad) = vector.positions.iter().find(|&&p| p as usize >= stems) {
            return Err(Error::vector(doc_id, format!("position refers to stem {bad}, table has {stems}")));
        }
        Ok(Self { doc_id, vector })
    }

    pub fn doc_id(&self) -> DocId { self.doc_id }

    /// Raw tokens, sentinels included.
    pub fn tokens(&self) -> impl Iterator<Item = &'a str> + 'a {
        let vector: &'a StoredDocVector = self.vector;
        vector.positions.iter().map(move |&p| vector.stems[p as usize].as_str())
    }

    fn real_tokens(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.tokens().filter(|t| *t != OOV)
    }

    /// Real tokens in document order.
    pub fn terms(&self) -> Vec<String> {
        self.real_tokens().map(str::to_string).collect()
    }

    /// Term counts, OOV and (when a stopper is given) stop-terms excluded.
    pub fn feature_vector(&self, stopper: Option<&Stopper>) -> FeatureVector {
        let mut fv = FeatureVector::new();
        for tok in self.real_tokens() {
            if stopper.is_some_and(|s| s.is_stop_word(tok)) { continue; }
            fv.add_term(tok, 1.0);
        }
        fv
    }

    /// Real tokens keyed by position, renumbered from 0 with no gaps.
    pub fn term_positions(&self) -> BTreeMap<u32, String> {
        self.real_tokens().enumerate().map(|(i, t)| (i as u32, t.to_string())).collect()
    }

    /// Real tokens joined by single spaces.
    pub fn text(&self) -> String {
        self.real_tokens().collect::<Vec<_>>().join(" ")
    }

    pub fn len(&self) -> usize { self.vector.positions.len() }

    pub fn is_empty(&self) -> bool { self.vector.positions.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StoredDocVector {
        StoredDocVector::from_tokens([Some("the"), None, Some("cat"), None, Some("sat")])
    }

    #[test]
    fn oov_tokens_are_dropped_in_order() {
        let v = sample();
        let x = DocumentVectorExtractor::new(7, &v).unwrap();
        assert_eq!(x.tokens().collect::<Vec<_>>(), vec!["the", OOV, "cat", OOV, "sat"]);
        assert_eq!(x.terms(), vec!["the", "cat", "sat"]);
        assert_eq!(x.text(), "the cat sat");
    }

    #[test]
    fn feature_vector_counts_real_tokens() {
        let v = sample();
        let fv = DocumentVectorExtractor::new(7, &v).unwrap().feature_vector(None);
        assert_eq!(fv.feature_count(), 3);
        for t in ["the", "cat", "sat"] {
            assert_eq!(fv.weight(t), 1.0);
        }
        assert!(!fv.contains(OOV));
    }

    #[test]
    fn stopper_filters_feature_vector() {
        let v = sample();
        let stopper = Stopper::from_words(["the"]);
        let fv = DocumentVectorExtractor::new(7, &v).unwrap().feature_vector(Some(&stopper));
        assert_eq!(fv.feature_count(), 2);
        assert!(!fv.contains("the"));
    }

    #[test]
    fn positions_close_gaps() {
        let v = sample();
        let pos = DocumentVectorExtractor::new(7, &v).unwrap().term_positions();
        let expected: BTreeMap<u32, String> =
            [(0, "the"), (1, "cat"), (2, "sat")].into_iter().map(|(p, t)| (p, t.to_string())).collect();
        assert_eq!(pos, expected);
    }

    #[test]
    fn empty_document_is_valid() {
        let v = StoredDocVector::default();
        let x = DocumentVectorExtractor::new(0, &v).unwrap();
        assert!(x.is_empty());
        assert!(x.feature_vector(None).is_empty());
    }

    #[test]
    fn corrupt_vector_is_an_error() {
        let v = StoredDocVector { stems: vec![OOV.into()], positions: vec![0, 3] };
        assert!(matches!(DocumentVectorExtractor::new(4, &v), Err(Error::VectorRetrieval { doc_id: 4, .. })));
    }
}

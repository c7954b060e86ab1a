//! Scoring functions, selected by name.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::index::TermStats;

pub const DEFAULT_SCORING: &str = "tfidf";

/// Collection-wide numbers a scoring function may need.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionStats {
    pub num_docs: f64,
    pub total_terms: f64,
    pub avg_doc_len: f64,
}

pub trait ScoringFunction: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Contribution of a term occurring `tf` times in a document of `doc_len` positions.
    fn score(&self, tf: f64, doc_len: f64, term: TermStats, coll: &CollectionStats) -> f64;

    /// Contribution of a query term the document does not contain.
    fn score_absent(&self, _doc_len: f64, _term: TermStats, _coll: &CollectionStats) -> f64 { 0.0 }
}

/// `(1 + ln tf) · ln(1 + N/df)`.
#[derive(Debug, Default)]
pub struct TfIdf;

impl ScoringFunction for TfIdf {
    fn name(&self) -> &'static str { "tfidf" }

    fn score(&self, tf: f64, _doc_len: f64, term: TermStats, coll: &CollectionStats) -> f64 {
        if tf <= 0.0 { return 0.0; }
        let df = (term.df as f64).max(1.0);
        (1.0 + tf.ln()) * (1.0 + coll.num_docs / df).ln()
    }
}

#[derive(Debug)]
pub struct Bm25 {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25 {
    fn default() -> Self { Self { k1: 1.2, b: 0.75 } }
}

impl ScoringFunction for Bm25 {
    fn name(&self) -> &'static str { "bm25" }

    fn score(&self, tf: f64, doc_len: f64, term: TermStats, coll: &CollectionStats) -> f64 {
        if tf <= 0.0 { return 0.0; }
        let df = term.df as f64;
        let idf = (1.0 + (coll.num_docs - df + 0.5) / (df + 0.5)).ln();
        let avg = if coll.avg_doc_len > 0.0 { coll.avg_doc_len } else { 1.0 };
        let norm = self.k1 * (1.0 - self.b + self.b * doc_len / avg);
        idf * tf * (self.k1 + 1.0) / (tf + norm)
    }
}

/// Query likelihood with Dirichlet smoothing.
#[derive(Debug)]
pub struct Dirichlet {
    pub mu: f64,
}

impl Default for Dirichlet {
    fn default() -> Self { Self { mu: 2500.0 } }
}

impl Dirichlet {
    fn background(&self, term: TermStats, coll: &CollectionStats) -> f64 {
        let total = coll.total_terms.max(1.0);
        // unseen terms get half an occurrence so the log stays finite
        (term.cf as f64).max(0.5) / total
    }
}

impl ScoringFunction for Dirichlet {
    fn name(&self) -> &'static str { "dirichlet" }

    fn score(&self, tf: f64, doc_len: f64, term: TermStats, coll: &CollectionStats) -> f64 {
        let p = self.background(term, coll);
        ((tf + self.mu * p) / (doc_len + self.mu)).ln()
    }

    fn score_absent(&self, doc_len: f64, term: TermStats, coll: &CollectionStats) -> f64 {
        self.score(0.0, doc_len, term, coll)
    }
}

/// Looks a scoring function up by name; empty means [`DEFAULT_SCORING`].
pub fn resolve_scoring(name: Option<&str>) -> Result<Arc<dyn ScoringFunction>> {
    let name = match name.map(str::trim) {
        None | Some("") => DEFAULT_SCORING.to_string(),
        Some(n) => n.to_lowercase(),
    };
    match name.as_str() {
        "tfidf" | "default" | "classic" => Ok(Arc::new(TfIdf)),
        "bm25" => Ok(Arc::new(Bm25::default())),
        "dirichlet" | "lm" => Ok(Arc::new(Dirichlet::default())),
        _ => Err(Error::UnknownScoringFunction(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coll() -> CollectionStats {
        CollectionStats { num_docs: 100.0, total_terms: 10_000.0, avg_doc_len: 100.0 }
    }

    #[test]
    fn resolves_names_and_aliases() {
        assert_eq!(resolve_scoring(None).unwrap().name(), "tfidf");
        assert_eq!(resolve_scoring(Some("Default")).unwrap().name(), "tfidf");
        assert_eq!(resolve_scoring(Some("BM25")).unwrap().name(), "bm25");
        assert_eq!(resolve_scoring(Some("lm")).unwrap().name(), "dirichlet");
        assert!(matches!(resolve_scoring(Some("pivoted")), Err(Error::UnknownScoringFunction(_))));
    }

    #[test]
    fn rarer_terms_score_higher() {
        for f in [resolve_scoring(Some("tfidf")).unwrap(), resolve_scoring(Some("bm25")).unwrap()] {
            let rare = f.score(2.0, 100.0, TermStats { df: 2, cf: 4 }, &coll());
            let common = f.score(2.0, 100.0, TermStats { df: 80, cf: 400 }, &coll());
            assert!(rare > common, "{}", f.name());
            assert_eq!(f.score(0.0, 100.0, TermStats { df: 2, cf: 4 }, &coll()), 0.0);
        }
    }

    #[test]
    fn dirichlet_prefers_matching_docs() {
        let d = Dirichlet::default();
        let stats = TermStats { df: 10, cf: 50 };
        assert!(d.score(3.0, 100.0, stats, &coll()) > d.score_absent(100.0, stats, &coll()));
    }
}

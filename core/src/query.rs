use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::analysis::TextProcessor;
use crate::backend::IndexCapability;
use crate::error::Result;
use crate::features::FeatureVector;
use crate::hits::{SearchHit, SearchHits};
use crate::index::{DocId, DocMeta};

/// A weighted bag of query terms plus the text it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub title: String,
    pub text: String,
    pub features: FeatureVector,
}

impl Query {
    /// Analyzes `text`; repeated terms add up.
    pub fn from_text(text: &str, processor: &dyn TextProcessor) -> Self {
        let terms = processor.terms(text);
        let features = terms.iter().map(String::as_str).collect();
        Self { title: String::new(), text: text.to_string(), features }
    }

    pub fn with_features(title: impl Into<String>, features: FeatureVector) -> Self {
        Self { title: title.into(), text: String::new(), features }
    }
}

/// Scores every document that contains at least one query term and keeps the
/// best `top_k`, in no particular order.
pub(crate) fn evaluate<I>(index: &I, query: &Query, top_k: usize) -> Result<SearchHits>
where
    I: IndexCapability + ?Sized,
{
    if top_k == 0 || query.features.is_empty() {
        return Ok(SearchHits::new());
    }
    let coll = index.collection_stats();
    let scorer = index.scoring();

    let mut terms = Vec::with_capacity(query.features.feature_count());
    let mut candidates = BTreeSet::new();
    for (term, weight) in query.features.iter() {
        let stats = index.term_stats(term)?.unwrap_or_default();
        let postings = index.docs_by_term(term)?;
        candidates.extend(postings.keys().copied());
        terms.push((weight, stats, postings));
    }

    let mut scored: Vec<(DocId, f64, DocMeta)> = Vec::with_capacity(candidates.len());
    for doc_id in candidates {
        let doc = index.document(doc_id)?;
        let dl = f64::from(doc.length);
        let score: f64 = terms
            .iter()
            .map(|(weight, stats, postings)| {
                let s = match postings.get(&doc_id) {
                    Some(&tf) => scorer.score(f64::from(tf), dl, *stats, &coll),
                    None => scorer.score_absent(dl, *stats, &coll),
                };
                weight * s
            })
            .sum();
        scored.push((doc_id, score, doc));
    }

    let by_score_desc = |a: &(DocId, f64, DocMeta), b: &(DocId, f64, DocMeta)| -> Ordering { b.1.total_cmp(&a.1) };
    if scored.len() > top_k {
        scored.select_nth_unstable_by(top_k - 1, by_score_desc);
        scored.truncate(top_k);
    }
    tracing::debug!(terms = terms.len(), hits = scored.len(), scoring = scorer.name(), "evaluated query");

    let mut hits = SearchHits::new();
    for (doc_id, score, doc) in scored {
        hits.add(SearchHit {
            docno: doc.docno,
            doc_id: Some(doc_id),
            score,
            length: f64::from(doc.length),
            metadata: doc.stored,
            features: None,
        });
    }
    Ok(hits)
}

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::features::FeatureVector;
use crate::index::DocId;

/// One scored document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub docno: String,
    /// Backend-internal id, only meaningful for the index that produced it.
    pub doc_id: Option<DocId>,
    pub score: f64,
    pub length: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureVector>,
}

impl SearchHit {
    pub fn new(docno: impl Into<String>, doc_id: DocId, score: f64) -> Self {
        Self { docno: docno.into(), doc_id: Some(doc_id), score, ..Default::default() }
    }

    /// True for the placeholder returned by out-of-range lookups.
    pub fn is_empty(&self) -> bool {
        self.docno.is_empty() && self.doc_id.is_none()
    }

    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata.get(name).map(String::as_str)
    }

    /// Orders by score, highest first.
    pub fn cmp_score_desc(&self, other: &SearchHit) -> Ordering {
        other.score.total_cmp(&self.score)
    }
}

/// Result list of one query. Rank order only holds after [`SearchHits::rank`].
///
/// The list carries its own cursor: [`SearchHits::iterator`] hands back the
/// in-progress cursor until it runs out, so a consumer that stops half way and
/// asks again resumes where it left off.
#[derive(Debug, Clone, Default)]
pub struct SearchHits {
    hits: Vec<SearchHit>,
    cursor: Option<usize>,
}

impl SearchHits {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, hit: SearchHit) { self.hits.push(hit); }

    /// Stable sort by descending score; equal scores keep insertion order.
    /// Resets the cursor to the first hit.
    pub fn rank(&mut self) {
        self.hits.sort_by(SearchHit::cmp_score_desc);
        self.cursor = Some(0);
    }

    /// Cursor over the hits. A new cursor is started only when none exists or
    /// the previous one is exhausted.
    pub fn iterator(&mut self) -> HitCursor<'_> {
        let exhausted = self.cursor.map_or(true, |pos| pos >= self.hits.len());
        if exhausted { self.cursor = Some(0); }
        let pos = self.cursor.get_or_insert(0);
        HitCursor { hits: &self.hits, pos }
    }

    /// Hit at position `i`, or an empty hit when `i` is past the end.
    pub fn hit(&self, i: usize) -> SearchHit {
        self.hits.get(i).cloned().unwrap_or_default()
    }

    pub fn size(&self) -> usize { self.hits.len() }

    pub fn is_empty(&self) -> bool { self.hits.is_empty() }

    /// Borrowing iteration that leaves the cursor alone.
    pub fn iter(&self) -> std::slice::Iter<'_, SearchHit> { self.hits.iter() }

    pub fn truncate(&mut self, k: usize) {
        self.hits.truncate(k);
        if let Some(pos) = self.cursor.as_mut() { *pos = (*pos).min(k); }
    }

    pub fn into_vec(self) -> Vec<SearchHit> { self.hits }
}

impl From<Vec<SearchHit>> for SearchHits {
    fn from(hits: Vec<SearchHit>) -> Self { Self { hits, cursor: None } }
}

impl<'a> IntoIterator for &'a SearchHits {
    type Item = &'a SearchHit;
    type IntoIter = std::slice::Iter<'a, SearchHit>;
    fn into_iter(self) -> Self::IntoIter { self.hits.iter() }
}

/// Forward-only cursor whose position is stored back into its [`SearchHits`].
pub struct HitCursor<'a> {
    hits: &'a [SearchHit],
    pos: &'a mut usize,
}

impl<'a> Iterator for HitCursor<'a> {
    type Item = &'a SearchHit;

    fn next(&mut self) -> Option<Self::Item> {
        let hits = self.hits;
        let hit = hits.get(*self.pos)?;
        *self.pos += 1;
        Some(hit)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.hits.len().saturating_sub(*self.pos);
        (left, Some(left))
    }
}

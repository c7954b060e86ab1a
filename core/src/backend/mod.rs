//! The read-side contract every backend satisfies, and opening an index by
//! path.
//!
//! Backends form a closed set ([`BackendKind`]); callers only ever see a
//! `Box<dyn IndexCapability>`. Statistics for unknown terms are zero, while
//! lookups of unknown documents fail with [`Error::DocumentNotFound`].
//! Unreadable term statistics are an error from [`IndexCapability::term_stats`]
//! and from query evaluation; the `f64` accessors log them and report zero.

use std::collections::BTreeMap;
use std::path::Path;

use crate::analysis::{PerFieldProcessor, ResolvedProcessor, Stopper};
use crate::docvec::DocumentVectorExtractor;
use crate::error::{Error, Result};
use crate::features::FeatureVector;
use crate::hits::{SearchHit, SearchHits};
use crate::index::{BackendKind, DocId, DocMeta, IndexMeta, StoredDocVector, TermStats, FORMAT_VERSION};
use crate::persist::{load_meta, IndexPaths};
use crate::query::{evaluate, Query};
use crate::scoring::{CollectionStats, ScoringFunction};

pub mod kv;
pub mod segment;

pub use kv::KvIndex;
pub use segment::SegmentIndex;

/// Read-only view of an open index. Implementations keep no per-call state,
/// so one instance can serve concurrent readers.
pub trait IndexCapability: Send + Sync {
    fn meta(&self) -> &IndexMeta;

    /// Query-time analysis, rebuilt from the specs recorded at build time.
    fn processor(&self) -> &PerFieldProcessor;

    fn scoring(&self) -> &dyn ScoringFunction;

    /// `Ok(None)` for terms the index has never seen; `Err` when the stored
    /// statistics cannot be read.
    fn term_stats(&self, term: &str) -> Result<Option<TermStats>>;

    /// Backend-internal id for an external docno.
    fn doc_id(&self, docno: &str) -> Result<DocId>;

    fn document(&self, doc_id: DocId) -> Result<DocMeta>;

    fn stored_vector(&self, doc_id: DocId) -> Result<StoredDocVector>;

    fn doc_text(&self, doc_id: DocId) -> Result<String>;

    /// Doc id → within-document frequency. Empty for unknown terms.
    fn docs_by_term(&self, term: &str) -> Result<BTreeMap<DocId, u32>>;

    /// Every indexed term, sorted.
    fn vocabulary(&self) -> Result<Vec<String>>;

    fn doc_count(&self) -> f64 { f64::from(self.meta().num_docs) }

    /// Total term occurrences in the collection.
    fn term_count(&self) -> f64 { self.meta().total_terms as f64 }

    /// Number of distinct terms.
    fn term_type_count(&self) -> f64 { self.meta().unique_terms as f64 }

    fn doc_length_avg(&self) -> f64 { self.meta().doc_length_avg() }

    fn collection_stats(&self) -> CollectionStats {
        CollectionStats { num_docs: self.doc_count(), total_terms: self.term_count(), avg_doc_len: self.doc_length_avg() }
    }

    /// Statistics for `term`, zeroed when the term is unknown. A read failure
    /// is logged at `warn` and also reported as zero.
    fn term_stats_or_zero(&self, term: &str) -> TermStats {
        match self.term_stats(term) {
            Ok(stats) => stats.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(term, error = %e, "term statistics unreadable, reporting zero");
                TermStats::default()
            }
        }
    }

    fn doc_freq(&self, term: &str) -> f64 {
        f64::from(self.term_stats_or_zero(term).df)
    }

    fn term_freq(&self, term: &str) -> f64 {
        self.term_stats_or_zero(term).cf as f64
    }

    fn docno(&self, doc_id: DocId) -> Result<String> {
        Ok(self.document(doc_id)?.docno)
    }

    fn doc_length(&self, doc_id: DocId) -> Result<f64> {
        Ok(f64::from(self.document(doc_id)?.length))
    }

    fn doc_vector(&self, doc_id: DocId, stopper: Option<&Stopper>) -> Result<FeatureVector> {
        let vector = self.stored_vector(doc_id)?;
        Ok(DocumentVectorExtractor::new(doc_id, &vector)?.feature_vector(stopper))
    }

    fn doc_vector_by_docno(&self, docno: &str, stopper: Option<&Stopper>) -> Result<FeatureVector> {
        self.doc_vector(self.doc_id(docno)?, stopper)
    }

    /// Terms in document order, OOV positions dropped.
    fn doc_terms(&self, doc_id: DocId) -> Result<Vec<String>> {
        let vector = self.stored_vector(doc_id)?;
        Ok(DocumentVectorExtractor::new(doc_id, &vector)?.terms())
    }

    /// Terms keyed by contiguous position, OOV positions removed.
    fn doc_term_positions(&self, doc_id: DocId) -> Result<BTreeMap<u32, String>> {
        let vector = self.stored_vector(doc_id)?;
        Ok(DocumentVectorExtractor::new(doc_id, &vector)?.term_positions())
    }

    /// Stored field value; `None` when the field was not stored for this document.
    fn metadata_value(&self, docno: &str, name: &str) -> Result<Option<String>> {
        let doc = self.document(self.doc_id(docno)?)?;
        if name == "docno" {
            return Ok(Some(doc.docno));
        }
        Ok(doc.stored.get(name).cloned())
    }

    /// Unscored hit for a document, carrying its vector and stored fields.
    fn search_hit(&self, docno: &str, stopper: Option<&Stopper>) -> Result<SearchHit> {
        let doc_id = self.doc_id(docno)?;
        let doc = self.document(doc_id)?;
        let features = self.doc_vector(doc_id, stopper)?;
        Ok(SearchHit {
            docno: doc.docno,
            doc_id: Some(doc_id),
            score: 0.0,
            length: f64::from(doc.length),
            metadata: doc.stored,
            features: Some(features),
        })
    }

    /// At most `top_k` hits; call [`SearchHits::rank`] for rank order.
    fn run_query(&self, query: &Query, top_k: usize) -> Result<SearchHits> {
        evaluate(self, query, top_k)
    }

    /// Processor for free-text queries: the one of the first indexed,
    /// tokenized field, or the default when no field qualifies.
    fn query_processor(&self) -> &ResolvedProcessor {
        match self.meta().fields.iter().find(|f| f.indexed && f.tokenized) {
            Some(field) => self.processor().for_field(&field.name),
            None => self.processor().default_processor(),
        }
    }

    fn run_query_text(&self, text: &str, top_k: usize) -> Result<SearchHits> {
        let query = Query::from_text(text, self.query_processor().processor.as_ref());
        self.run_query(&query, top_k)
    }
}

/// Opens whichever backend wrote the index at `path`.
pub fn open_index<P: AsRef<Path>>(path: P) -> Result<Box<dyn IndexCapability>> {
    let paths = IndexPaths::new(path);
    let meta = load_meta(&paths)?;
    if meta.version != FORMAT_VERSION {
        return Err(Error::Storage(format!(
            "index format version {} is not supported (expected {FORMAT_VERSION})",
            meta.version
        )));
    }
    tracing::info!(path = %paths.root.display(), backend = ?meta.backend, docs = meta.num_docs, "opening index");
    Ok(match meta.backend {
        BackendKind::Segment => Box::new(SegmentIndex::open(paths, meta)?),
        BackendKind::Kv => Box::new(KvIndex::open(paths, meta)?),
    })
}

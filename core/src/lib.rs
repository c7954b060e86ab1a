//! Backend-agnostic full-text index: analysis, scoring, the read-side
//! [`IndexCapability`] contract with its `segment` and `kv` backends, and the
//! writers that build them.

pub mod analysis;
pub mod backend;
pub mod config;
pub mod corpus;
pub mod docvec;
pub mod error;
pub mod features;
pub mod hits;
pub mod index;
pub mod persist;
pub mod query;
pub mod scoring;
pub mod writer;

pub use analysis::{resolve_processor, PerFieldProcessor, ProcessorSpec, Stopper, TextProcessor, Token};
pub use backend::{open_index, IndexCapability};
pub use config::{CorpusFormat, FieldSpec, IndexBuildConfig};
pub use corpus::{CorpusReader, DocumentStream, RawDocument};
pub use docvec::DocumentVectorExtractor;
pub use error::{Error, Result};
pub use features::FeatureVector;
pub use hits::{SearchHit, SearchHits};
pub use index::{BackendKind, DocId, DocMeta, IndexMeta, StoredDocVector, TermId, TermStats, OOV};
pub use query::Query;
pub use scoring::{resolve_scoring, ScoringFunction};
pub use writer::{analyze_document, create_writer, AnalyzedDocument, IndexWriter, IndexWriterConfig};

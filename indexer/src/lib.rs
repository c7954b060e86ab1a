//! Configuration-driven index construction.
//!
//! [`IndexBuilder`] resolves every named component before it touches the
//! output location, so a bad processor, scoring name or corpus type leaves
//! nothing behind.

use std::path::Path;
use std::time::Instant;

use irkit_core::{
    analyze_document, create_writer, resolve_scoring, CorpusReader, IndexBuildConfig, IndexWriterConfig,
    PerFieldProcessor, Result,
};

pub mod corpus;

pub use corpus::reader_for;

const PROGRESS_EVERY: u32 = 10_000;

/// Counts reported once the index is published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub documents: u32,
    pub terms: u64,
    pub unique_terms: u64,
}

#[derive(Debug, Clone)]
pub struct IndexBuilder {
    config: IndexBuildConfig,
}

impl IndexBuilder {
    pub fn new(config: IndexBuildConfig) -> Self { Self { config } }

    /// Loads and validates a YAML build configuration.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(IndexBuildConfig::from_path(path)?))
    }

    pub fn config(&self) -> &IndexBuildConfig { &self.config }

    /// Builds with the reader registered for the configured corpus type.
    pub fn build(&self) -> Result<BuildStats> {
        let format = self.config.corpus_format()?;
        tracing::info!(format = %format, corpus = %self.config.corpus.path.display(), "corpus format");
        let reader = reader_for(format);
        self.build_with_reader(reader.as_ref())
    }

    /// Builds from an arbitrary reader; the configured corpus type is not
    /// consulted.
    pub fn build_with_reader(&self, reader: &dyn CorpusReader) -> Result<BuildStats> {
        let mut config = self.config.clone();
        config.validate()?;

        let processor = PerFieldProcessor::resolve(config.analyzer.as_deref(), config.stopwords.as_deref(), &config.fields)?;
        let scoring = resolve_scoring(config.similarity.as_deref())?;
        tracing::info!(
            processor = processor.default_processor().name(),
            overrides = processor.field_specs().len(),
            scoring = scoring.name(),
            backend = ?config.backend,
            "resolved build components"
        );

        let documents = reader.documents(&config.corpus.path)?;
        let writer_config = IndexWriterConfig::new(scoring.name(), &processor, &config.fields, config.ram_buffer_bytes());
        let mut writer = create_writer(config.backend, &config.index_path, writer_config)?;

        let started = Instant::now();
        for doc in documents {
            let doc = doc?;
            writer.add_document(analyze_document(&doc, &config.fields, &processor))?;
            let n = writer.num_docs();
            if n % PROGRESS_EVERY == 0 {
                tracing::info!(docs = n, elapsed_ms = started.elapsed().as_millis() as u64, "indexing");
            }
        }

        let meta = writer.finish()?;
        tracing::info!(
            path = %config.index_path.display(),
            docs = meta.num_docs,
            terms = meta.total_terms,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "index build complete"
        );
        Ok(BuildStats { documents: meta.num_docs, terms: meta.total_terms, unique_terms: meta.unique_terms })
    }
}

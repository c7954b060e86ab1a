//! Build-time side of the backends: document analysis, the writer trait and
//! the staged output location every writer publishes through.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::analysis::{PerFieldProcessor, ProcessorSpec};
use crate::backend::{kv::KvWriter, segment::SegmentWriter};
use crate::config::FieldSpec;
use crate::corpus::RawDocument;
use crate::error::{Error, Result};
use crate::index::{BackendKind, DocId, IndexMeta, StoredDocVector, TermStats, FORMAT_VERSION};
use crate::persist::{load_meta, IndexPaths};

/// A document after field processing, ready for any backend.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedDocument {
    pub docno: String,
    pub vector: StoredDocVector,
    pub term_freqs: BTreeMap<String, u32>,
    /// Count of real (non-OOV) terms.
    pub length: u32,
    pub stored: BTreeMap<String, String>,
    /// Raw text of the indexed fields, one field per line.
    pub text: String,
}

/// Runs each configured field through its processor. Fields missing from the
/// document are skipped; stop-terms become OOV positions.
pub fn analyze_document(doc: &RawDocument, fields: &[FieldSpec], processor: &PerFieldProcessor) -> AnalyzedDocument {
    let mut tokens: Vec<Option<String>> = Vec::new();
    let mut stored = BTreeMap::new();
    let mut text = Vec::new();
    for field in fields {
        let Some(value) = doc.field(&field.name) else { continue };
        if field.stored {
            stored.insert(field.name.clone(), value.to_string());
        }
        if !field.indexed { continue; }
        text.push(value);
        if field.tokenized {
            tokens.extend(processor.tokens(&field.name, value).into_iter().map(|t| (!t.stopped).then_some(t.term)));
        } else if !value.trim().is_empty() {
            tokens.push(Some(value.trim().to_string()));
        }
    }

    let mut term_freqs: BTreeMap<String, u32> = BTreeMap::new();
    for term in tokens.iter().flatten() {
        *term_freqs.entry(term.clone()).or_insert(0) += 1;
    }
    let length = term_freqs.values().sum();
    let vector = StoredDocVector::from_tokens(tokens.iter().map(|t| t.as_deref()));
    AnalyzedDocument { docno: doc.docno.clone(), vector, term_freqs, length, stored, text: text.join("\n") }
}

/// Everything a writer records in `meta.json` besides its own counts.
#[derive(Debug, Clone)]
pub struct IndexWriterConfig {
    pub scoring: String,
    pub default_processor: ProcessorSpec,
    pub field_processors: BTreeMap<String, ProcessorSpec>,
    pub fields: Vec<FieldSpec>,
    /// In-memory budget for buffered postings.
    pub ram_buffer_bytes: usize,
}

impl IndexWriterConfig {
    pub fn new(scoring: &str, processor: &PerFieldProcessor, fields: &[FieldSpec], ram_buffer_bytes: usize) -> Self {
        Self {
            scoring: scoring.to_string(),
            default_processor: processor.default_processor().spec.clone(),
            field_processors: processor.field_specs(),
            fields: fields.to_vec(),
            ram_buffer_bytes,
        }
    }

    pub(crate) fn meta(&self, backend: BackendKind, num_docs: u32, total_terms: u64, unique_terms: u64) -> IndexMeta {
        let created_at = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        IndexMeta {
            version: FORMAT_VERSION,
            backend,
            created_at,
            num_docs,
            total_terms,
            unique_terms,
            scoring: self.scoring.clone(),
            default_processor: self.default_processor.clone(),
            field_processors: self.field_processors.clone(),
            fields: self.fields.clone(),
        }
    }
}

/// Single-threaded sink for analyzed documents.
///
/// `finish` publishes the index; dropping a writer without finishing discards
/// everything it wrote.
pub trait IndexWriter {
    fn add_document(&mut self, doc: AnalyzedDocument) -> Result<DocId>;

    fn num_docs(&self) -> u32;

    fn finish(self: Box<Self>) -> Result<IndexMeta>;
}

/// Opens a writer for `backend` that will publish at `target`.
pub fn create_writer(backend: BackendKind, target: &Path, config: IndexWriterConfig) -> Result<Box<dyn IndexWriter>> {
    let out = StagedOutput::acquire(target)?;
    Ok(match backend {
        BackendKind::Segment => Box::new(SegmentWriter::create(out, config)?),
        BackendKind::Kv => Box::new(KvWriter::create(out, config)?),
    })
}

pub(crate) fn writer_io(err: impl std::fmt::Display) -> Error {
    Error::WriterIo(err.to_string())
}

pub(crate) fn bump(stats: &mut TermStats, tf: u32) {
    stats.df += 1;
    stats.cf += u64::from(tf);
}

fn sibling(target: &Path, suffix: &str) -> PathBuf {
    let mut s = target.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

/// Exclusive claim on an output path. Holds `<target>.lock` and writes into
/// `<target>.staging`; `commit` swaps the staging directory into place.
/// Dropped uncommitted, it removes the staging directory and the lock.
#[derive(Debug)]
pub struct StagedOutput {
    target: PathBuf,
    staging: PathBuf,
    lock: PathBuf,
    committed: bool,
}

impl StagedOutput {
    pub fn acquire(target: &Path) -> Result<Self> {
        let target: PathBuf = target.components().collect();
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(writer_io)?;
        }
        let lock = sibling(&target, ".lock");
        match OpenOptions::new().write(true).create_new(true).open(&lock) {
            Ok(mut file) => {
                // Owner pid, for whoever finds a stale lock.
                if let Err(e) = writeln!(file, "{}", std::process::id()) {
                    tracing::debug!(path = %lock.display(), error = %e, "could not record lock owner");
                }
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let owner = fs::read_to_string(&lock).unwrap_or_default();
                tracing::warn!(lock = %lock.display(), owner = owner.trim(), "output location is locked");
                return Err(Error::IndexLocked(lock));
            }
            Err(e) => return Err(writer_io(e)),
        }
        let out = Self { staging: sibling(&target, ".staging"), target, lock, committed: false };
        out.check_replaceable()?;
        if out.staging.exists() {
            fs::remove_dir_all(&out.staging).map_err(writer_io)?;
        }
        fs::create_dir_all(&out.staging).map_err(writer_io)?;
        Ok(out)
    }

    /// `commit` deletes the target, so it must be absent, an empty
    /// directory, or an index with readable metadata.
    fn check_replaceable(&self) -> Result<()> {
        let target = &self.target;
        if !target.exists() {
            return Ok(());
        }
        if !target.is_dir() {
            return Err(writer_io(format!("refusing to replace {}: not a directory", target.display())));
        }
        let empty = fs::read_dir(target).map_err(writer_io)?.next().is_none();
        if empty || load_meta(&IndexPaths::new(target)).is_ok() {
            return Ok(());
        }
        Err(writer_io(format!("refusing to replace {}: not an index", target.display())))
    }

    pub fn staging(&self) -> &Path { &self.staging }

    pub fn target(&self) -> &Path { &self.target }

    /// Replaces whatever is at the target with the staged index.
    pub fn commit(mut self) -> Result<()> {
        if self.target.is_dir() {
            fs::remove_dir_all(&self.target).map_err(writer_io)?;
        } else if self.target.exists() {
            fs::remove_file(&self.target).map_err(writer_io)?;
        }
        fs::rename(&self.staging, &self.target).map_err(writer_io)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedOutput {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = fs::remove_dir_all(&self.staging) {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %self.staging.display(), error = %e, "could not remove staging directory");
                }
            }
        }
        let _ = fs::remove_file(&self.lock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldSpec;
    use crate::index::OOV;

    #[test]
    fn analysis_marks_stopped_positions_as_oov() {
        let processor = PerFieldProcessor::resolve(None, None, &[]).unwrap();
        let doc = RawDocument::new("d1").with_field("text", "the cat and the hat");
        let a = analyze_document(&doc, &[FieldSpec::named("text")], &processor);
        assert_eq!(a.vector.positions.len(), 5);
        assert_eq!(a.vector.stems[a.vector.positions[0] as usize], OOV);
        assert_eq!(a.length, 2);
        assert_eq!(a.term_freqs.get("cat"), Some(&1));
    }

    #[test]
    fn field_flags_are_honoured() {
        let processor = PerFieldProcessor::resolve(None, None, &[]).unwrap();
        let fields = vec![
            FieldSpec::named("text"),
            FieldSpec { tokenized: false, stored: true, ..FieldSpec::named("category") },
            FieldSpec { indexed: false, stored: true, ..FieldSpec::named("url") },
        ];
        let doc = RawDocument::new("d1")
            .with_field("text", "black cats")
            .with_field("category", " Pets ")
            .with_field("url", "http://x")
            .with_field("ignored", "zebra");
        let a = analyze_document(&doc, &fields, &processor);
        assert!(a.term_freqs.contains_key("Pets"));
        assert!(!a.term_freqs.contains_key("zebra"));
        assert!(!a.term_freqs.keys().any(|t| t.contains("http")));
        assert_eq!(a.stored.get("url").map(String::as_str), Some("http://x"));
        assert_eq!(a.stored.get("category").map(String::as_str), Some(" Pets "));
    }

    #[test]
    fn second_claim_on_a_path_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("idx");
        let first = StagedOutput::acquire(&target).unwrap();
        let pid = fs::read_to_string(dir.path().join("idx.lock")).unwrap();
        assert_eq!(pid.trim(), std::process::id().to_string());
        match StagedOutput::acquire(&target) {
            Err(Error::IndexLocked(lock)) => assert_eq!(lock, dir.path().join("idx.lock")),
            other => panic!("expected IndexLocked, got {other:?}"),
        }
        drop(first);
        assert!(!dir.path().join("idx.staging").exists());
        assert!(!target.exists());
        let again = StagedOutput::acquire(&target).unwrap();
        fs::write(again.staging().join("marker"), b"x").unwrap();
        again.commit().unwrap();
        assert!(target.join("marker").exists());
        assert!(!dir.path().join("idx.lock").exists());
    }

    #[test]
    fn foreign_directory_is_never_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("data");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("notes.txt"), b"keep me").unwrap();
        assert!(matches!(StagedOutput::acquire(&target), Err(Error::WriterIo(_))));
        assert_eq!(fs::read(target.join("notes.txt")).unwrap(), b"keep me");
        assert!(!dir.path().join("data.lock").exists());
        assert!(!dir.path().join("data.staging").exists());

        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(StagedOutput::acquire(&file), Err(Error::WriterIo(_))));
        assert!(file.is_file());
    }

    #[test]
    fn empty_directory_can_be_claimed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("idx");
        fs::create_dir_all(&target).unwrap();
        let out = StagedOutput::acquire(&target).unwrap();
        out.commit().unwrap();
        assert!(target.is_dir());
    }
}

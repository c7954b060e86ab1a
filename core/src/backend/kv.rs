//! sled-backed backend.
//!
//! Trees (doc ids are big-endian `u32` keys):
//! `docs` doc id → DocMeta, `docnos` docno → doc id, `vectors` doc id →
//! StoredDocVector, `texts` doc id → text, `postings` term `\0` doc id → tf,
//! `terms` term → TermStats. `meta.json` sits next to the database directory.

use lazy_static::lazy_static;
use parking_lot::Mutex;
use sled::{Batch, Db, Tree};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use crate::analysis::PerFieldProcessor;
use crate::backend::IndexCapability;
use crate::error::{Error, Result};
use crate::index::{BackendKind, DocId, DocMeta, IndexMeta, StoredDocVector, TermStats};
use crate::persist::{save_meta, IndexPaths};
use crate::scoring::{resolve_scoring, ScoringFunction};
use crate::writer::{bump, writer_io, AnalyzedDocument, IndexWriter, IndexWriterConfig, StagedOutput};

const SEP: u8 = 0;

fn doc_key(doc_id: DocId) -> [u8; 4] { doc_id.to_be_bytes() }

fn decode_doc_id(bytes: &[u8]) -> Result<DocId> {
    <[u8; 4]>::try_from(bytes)
        .map(u32::from_be_bytes)
        .map_err(|_| Error::Storage(format!("malformed doc id ({} bytes)", bytes.len())))
}

fn term_prefix(term: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(term.len() + 1);
    key.extend_from_slice(term.as_bytes());
    key.push(SEP);
    key
}

fn posting_key(term: &str, doc_id: DocId) -> Vec<u8> {
    let mut key = term_prefix(term);
    key.extend_from_slice(&doc_key(doc_id));
    key
}

struct Trees {
    docs: Tree,
    docnos: Tree,
    vectors: Tree,
    texts: Tree,
    postings: Tree,
    terms: Tree,
}

impl Trees {
    fn open(db: &Db) -> Result<Self> {
        Ok(Self {
            docs: db.open_tree("docs")?,
            docnos: db.open_tree("docnos")?,
            vectors: db.open_tree("vectors")?,
            texts: db.open_tree("texts")?,
            postings: db.open_tree("postings")?,
            terms: db.open_tree("terms")?,
        })
    }
}

/// Fields drop in order: the database closes before `out` cleans up staging.
pub struct KvWriter {
    trees: Trees,
    db: Db,
    paths: IndexPaths,
    config: IndexWriterConfig,
    stats: HashMap<String, TermStats>,
    num_docs: u32,
    total_terms: u64,
    out: StagedOutput,
}

impl KvWriter {
    pub fn create(out: StagedOutput, config: IndexWriterConfig) -> Result<Self> {
        let paths = IndexPaths::new(out.staging());
        let db = sled::Config::new()
            .path(paths.kv_db())
            .cache_capacity(config.ram_buffer_bytes as u64)
            .open()
            .map_err(writer_io)?;
        let trees = Trees::open(&db).map_err(writer_io)?;
        tracing::debug!(staging = %paths.root.display(), cache_bytes = config.ram_buffer_bytes, "kv writer opened");
        Ok(Self { trees, db, paths, config, stats: HashMap::new(), num_docs: 0, total_terms: 0, out })
    }
}

impl IndexWriter for KvWriter {
    fn add_document(&mut self, doc: AnalyzedDocument) -> Result<DocId> {
        if self.trees.docnos.contains_key(doc.docno.as_bytes()).map_err(writer_io)? {
            return Err(Error::Corpus(format!("duplicate docno: {}", doc.docno)));
        }
        let doc_id = self.num_docs;
        let key = doc_key(doc_id);

        let mut postings = Batch::default();
        for (term, tf) in &doc.term_freqs {
            postings.insert(posting_key(term, doc_id), &tf.to_be_bytes()[..]);
            bump(self.stats.entry(term.clone()).or_default(), *tf);
        }
        self.trees.postings.apply_batch(postings).map_err(writer_io)?;

        self.trees.vectors.insert(key, bincode::serialize(&doc.vector).map_err(writer_io)?).map_err(writer_io)?;
        self.trees.texts.insert(key, doc.text.as_bytes()).map_err(writer_io)?;
        let meta = DocMeta { docno: doc.docno, length: doc.length, stored: doc.stored };
        self.trees.docs.insert(key, bincode::serialize(&meta).map_err(writer_io)?).map_err(writer_io)?;
        self.trees.docnos.insert(meta.docno.as_bytes(), &key[..]).map_err(writer_io)?;

        self.num_docs += 1;
        self.total_terms += u64::from(meta.length);
        Ok(doc_id)
    }

    fn num_docs(&self) -> u32 { self.num_docs }

    fn finish(self: Box<Self>) -> Result<IndexMeta> {
        let KvWriter { trees, db, paths, config, stats, num_docs, total_terms, out } = *self;
        let mut batch = Batch::default();
        for (term, s) in &stats {
            batch.insert(term.as_bytes(), bincode::serialize(s).map_err(writer_io)?);
        }
        trees.terms.apply_batch(batch).map_err(writer_io)?;
        db.flush().map_err(writer_io)?;
        drop(trees);
        drop(db);

        let meta = config.meta(BackendKind::Kv, num_docs, total_terms, stats.len() as u64);
        save_meta(&paths, &meta).map_err(writer_io)?;
        let target = out.target().to_path_buf();
        out.commit()?;
        tracing::info!(path = %target.display(), docs = meta.num_docs, terms = meta.unique_terms, "kv index written");
        Ok(meta)
    }
}

/// An open database and its trees. Trees drop before the database.
struct Store {
    trees: Trees,
    _db: Db,
}

/// Keyed by canonical database path and build timestamp, so a rebuilt index
/// at the same path never resolves to a stale handle.
type StoreKey = (PathBuf, String);

lazy_static! {
    static ref OPEN_STORES: Mutex<HashMap<StoreKey, Weak<Store>>> = Mutex::new(HashMap::new());
}

/// sled locks its directory for the lifetime of a `Db`, so every reader of
/// one index in this process shares a single handle.
fn shared_store(db_path: &Path, created_at: &str) -> Result<Arc<Store>> {
    let canonical = std::fs::canonicalize(db_path)
        .map_err(|e| Error::Storage(format!("opening {}: {e}", db_path.display())))?;
    let key = (canonical, created_at.to_string());

    let mut open = OPEN_STORES.lock();
    open.retain(|_, store| store.strong_count() > 0);
    if let Some(store) = open.get(&key).and_then(Weak::upgrade) {
        tracing::debug!(path = %key.0.display(), "reusing open kv store");
        return Ok(store);
    }
    let db = sled::open(&key.0)?;
    let trees = Trees::open(&db)?;
    let store = Arc::new(Store { trees, _db: db });
    open.insert(key, Arc::downgrade(&store));
    Ok(store)
}

/// Reader over a sled index. Any number of instances may be open on the same
/// index; they share one underlying database handle.
pub struct KvIndex {
    meta: IndexMeta,
    processor: PerFieldProcessor,
    scoring: Arc<dyn ScoringFunction>,
    store: Arc<Store>,
}

impl KvIndex {
    pub fn open(paths: IndexPaths, meta: IndexMeta) -> Result<Self> {
        let store = shared_store(&paths.kv_db(), &meta.created_at)?;
        let processor = PerFieldProcessor::from_specs(&meta.default_processor, &meta.field_processors)?;
        let scoring = resolve_scoring(Some(meta.scoring.as_str()))?;
        Ok(Self { meta, processor, scoring, store })
    }

    fn trees(&self) -> &Trees { &self.store.trees }
}

impl IndexCapability for KvIndex {
    fn meta(&self) -> &IndexMeta { &self.meta }

    fn processor(&self) -> &PerFieldProcessor { &self.processor }

    fn scoring(&self) -> &dyn ScoringFunction { self.scoring.as_ref() }

    fn term_stats(&self, term: &str) -> Result<Option<TermStats>> {
        match self.trees().terms.get(term.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn doc_id(&self, docno: &str) -> Result<DocId> {
        match self.trees().docnos.get(docno.as_bytes())? {
            Some(bytes) => decode_doc_id(&bytes),
            None => Err(Error::DocumentNotFound(docno.to_string())),
        }
    }

    fn document(&self, doc_id: DocId) -> Result<DocMeta> {
        let bytes = self.trees().docs.get(doc_key(doc_id))?
            .ok_or_else(|| Error::DocumentNotFound(format!("doc id {doc_id}")))?;
        Ok(bincode::deserialize(&bytes)?)
    }

    fn stored_vector(&self, doc_id: DocId) -> Result<StoredDocVector> {
        let bytes = self.trees().vectors.get(doc_key(doc_id))
            .map_err(|e| Error::vector(doc_id, e.to_string()))?
            .ok_or_else(|| Error::vector(doc_id, "no stored vector"))?;
        bincode::deserialize(&bytes).map_err(|e| Error::vector(doc_id, e.to_string()))
    }

    fn doc_text(&self, doc_id: DocId) -> Result<String> {
        let bytes = self.trees().texts.get(doc_key(doc_id))?
            .ok_or_else(|| Error::DocumentNotFound(format!("doc id {doc_id}")))?;
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::Storage(e.to_string()))
    }

    fn docs_by_term(&self, term: &str) -> Result<BTreeMap<DocId, u32>> {
        let prefix = term_prefix(term);
        let mut out = BTreeMap::new();
        for entry in self.trees().postings.scan_prefix(&prefix) {
            let (key, value) = entry?;
            let doc_id = decode_doc_id(&key[prefix.len()..])?;
            let tf = <[u8; 4]>::try_from(&value[..])
                .map(u32::from_be_bytes)
                .map_err(|_| Error::Storage("malformed term frequency".into()))?;
            out.insert(doc_id, tf);
        }
        Ok(out)
    }

    fn vocabulary(&self) -> Result<Vec<String>> {
        let mut terms = Vec::with_capacity(self.meta.unique_terms as usize);
        for key in self.trees().terms.iter().keys() {
            terms.push(String::from_utf8_lossy(&key?).into_owned());
        }
        Ok(terms)
    }
}

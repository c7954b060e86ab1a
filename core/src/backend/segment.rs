//! Directory-of-files backend.
//!
//! Layout under the index root:
//!
//! ```text
//! meta.json            IndexMeta
//! dictionary.bin       term → term id, plus per-term stats
//! docs.bin             DocMeta per doc id
//! doc_id_map.bin       docno → doc id
//! postings/NNNNNNNN.postings.bin   one or more Vec<Posting> chunks per term
//! vectors/NNNNNNNN.vec.bin         StoredDocVector per doc
//! texts/N.txt                      raw text of the indexed fields
//! ```

use std::collections::{BTreeMap, HashMap};
use std::mem::size_of;
use std::sync::Arc;

use crate::analysis::PerFieldProcessor;
use crate::backend::IndexCapability;
use crate::error::{Error, Result};
use crate::index::{BackendKind, DocId, DocMeta, IndexMeta, Posting, StoredDocVector, TermId, TermStats};
use crate::persist::{
    append_postings_for_term, load_index_header, load_postings_for_term, load_text, load_vector, save_dictionary,
    save_doc_id_map, save_docs, save_meta, save_text, save_vector, IndexPaths,
};
use crate::scoring::{resolve_scoring, ScoringFunction};
use crate::writer::{bump, writer_io, AnalyzedDocument, IndexWriter, IndexWriterConfig, StagedOutput};

pub struct SegmentWriter {
    out: StagedOutput,
    paths: IndexPaths,
    config: IndexWriterConfig,
    dictionary: HashMap<String, TermId>,
    stats: Vec<TermStats>,
    pending: HashMap<TermId, Vec<Posting>>,
    pending_bytes: usize,
    docs: Vec<DocMeta>,
    doc_id_map: HashMap<String, DocId>,
    total_terms: u64,
}

impl SegmentWriter {
    pub fn create(out: StagedOutput, config: IndexWriterConfig) -> Result<Self> {
        let paths = IndexPaths::new(out.staging());
        paths.create_layout().map_err(writer_io)?;
        tracing::debug!(staging = %paths.root.display(), buffer_bytes = config.ram_buffer_bytes, "segment writer opened");
        Ok(Self {
            out,
            paths,
            config,
            dictionary: HashMap::new(),
            stats: Vec::new(),
            pending: HashMap::new(),
            pending_bytes: 0,
            docs: Vec::new(),
            doc_id_map: HashMap::new(),
            total_terms: 0,
        })
    }

    fn flush_postings(&mut self) -> Result<()> {
        if self.pending.is_empty() { return Ok(()); }
        let terms = self.pending.len();
        for (term_id, postings) in self.pending.drain() {
            append_postings_for_term(&self.paths, term_id, &postings).map_err(writer_io)?;
        }
        tracing::debug!(terms, bytes = self.pending_bytes, "flushed buffered postings");
        self.pending_bytes = 0;
        Ok(())
    }
}

impl IndexWriter for SegmentWriter {
    fn add_document(&mut self, doc: AnalyzedDocument) -> Result<DocId> {
        if self.doc_id_map.contains_key(&doc.docno) {
            return Err(Error::Corpus(format!("duplicate docno: {}", doc.docno)));
        }
        let doc_id = self.docs.len() as DocId;
        save_vector(&self.paths, doc_id, &doc.vector).map_err(writer_io)?;
        save_text(&self.paths, doc_id, &doc.text).map_err(writer_io)?;

        for (term, tf) in doc.term_freqs {
            let next_id = self.dictionary.len() as TermId;
            let term_id = match self.dictionary.get(&term) {
                Some(&id) => id,
                None => {
                    self.pending_bytes += term.len() + size_of::<TermId>() + size_of::<TermStats>();
                    self.dictionary.insert(term, next_id);
                    self.stats.push(TermStats::default());
                    next_id
                }
            };
            bump(&mut self.stats[term_id as usize], tf);
            self.pending.entry(term_id).or_default().push(Posting { doc_id, tf });
            self.pending_bytes += size_of::<Posting>();
        }

        self.total_terms += u64::from(doc.length);
        self.doc_id_map.insert(doc.docno.clone(), doc_id);
        self.docs.push(DocMeta { docno: doc.docno, length: doc.length, stored: doc.stored });

        if self.pending_bytes >= self.config.ram_buffer_bytes {
            self.flush_postings()?;
        }
        Ok(doc_id)
    }

    fn num_docs(&self) -> u32 { self.docs.len() as u32 }

    fn finish(mut self: Box<Self>) -> Result<IndexMeta> {
        self.flush_postings()?;
        let meta = self.config.meta(BackendKind::Segment, self.num_docs(), self.total_terms, self.dictionary.len() as u64);
        let dictionary = std::mem::take(&mut self.dictionary);
        let stats = std::mem::take(&mut self.stats);
        save_dictionary(&self.paths, &(dictionary, stats)).map_err(writer_io)?;
        save_docs(&self.paths, &self.docs).map_err(writer_io)?;
        save_doc_id_map(&self.paths, &self.doc_id_map).map_err(writer_io)?;
        save_meta(&self.paths, &meta).map_err(writer_io)?;

        let SegmentWriter { out, .. } = *self;
        let target = out.target().to_path_buf();
        out.commit()?;
        tracing::info!(path = %target.display(), docs = meta.num_docs, terms = meta.unique_terms, "segment index written");
        Ok(meta)
    }
}

/// Reader over a segment directory. Dictionary, documents and the docno map
/// live in memory; postings, vectors and texts are read per call.
pub struct SegmentIndex {
    paths: IndexPaths,
    meta: IndexMeta,
    processor: PerFieldProcessor,
    scoring: Arc<dyn ScoringFunction>,
    dictionary: HashMap<String, TermId>,
    stats: Vec<TermStats>,
    docs: Vec<DocMeta>,
    doc_id_map: HashMap<String, DocId>,
}

impl SegmentIndex {
    pub fn open(paths: IndexPaths, meta: IndexMeta) -> Result<Self> {
        let ((dictionary, stats), docs, doc_id_map) = load_index_header(&paths)?;
        let processor = PerFieldProcessor::from_specs(&meta.default_processor, &meta.field_processors)?;
        let scoring = resolve_scoring(Some(meta.scoring.as_str()))?;
        Ok(Self { paths, meta, processor, scoring, dictionary, stats, docs, doc_id_map })
    }

    fn check_doc(&self, doc_id: DocId) -> Result<&DocMeta> {
        self.docs.get(doc_id as usize).ok_or_else(|| Error::DocumentNotFound(format!("doc id {doc_id}")))
    }
}

impl IndexCapability for SegmentIndex {
    fn meta(&self) -> &IndexMeta { &self.meta }

    fn processor(&self) -> &PerFieldProcessor { &self.processor }

    fn scoring(&self) -> &dyn ScoringFunction { self.scoring.as_ref() }

    fn term_stats(&self, term: &str) -> Result<Option<TermStats>> {
        let Some(&id) = self.dictionary.get(term) else { return Ok(None) };
        self.stats
            .get(id as usize)
            .copied()
            .map(Some)
            .ok_or_else(|| Error::Storage(format!("term id {id} has no statistics")))
    }

    fn doc_id(&self, docno: &str) -> Result<DocId> {
        self.doc_id_map.get(docno).copied().ok_or_else(|| Error::DocumentNotFound(docno.to_string()))
    }

    fn document(&self, doc_id: DocId) -> Result<DocMeta> {
        self.check_doc(doc_id).cloned()
    }

    fn stored_vector(&self, doc_id: DocId) -> Result<StoredDocVector> {
        self.check_doc(doc_id).map_err(|_| Error::vector(doc_id, "no such document"))?;
        load_vector(&self.paths, doc_id)
    }

    fn doc_text(&self, doc_id: DocId) -> Result<String> {
        self.check_doc(doc_id)?;
        load_text(&self.paths, doc_id)
    }

    fn docs_by_term(&self, term: &str) -> Result<BTreeMap<DocId, u32>> {
        let Some(&term_id) = self.dictionary.get(term) else { return Ok(BTreeMap::new()) };
        Ok(load_postings_for_term(&self.paths, term_id)?.into_iter().map(|p| (p.doc_id, p.tf)).collect())
    }

    fn vocabulary(&self) -> Result<Vec<String>> {
        let mut terms: Vec<String> = self.dictionary.keys().cloned().collect();
        terms.sort();
        Ok(terms)
    }
}

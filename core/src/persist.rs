use crate::error::{Error, Result};
use crate::index::{DocId, DocMeta, IndexMeta, Posting, StoredDocVector, TermId, TermStats};
use std::collections::HashMap;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

pub type Dictionary = (HashMap<String, TermId>, Vec<TermStats>);

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn dictionary(&self) -> PathBuf { self.root.join("dictionary.bin") }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn postings_dir(&self) -> PathBuf { self.root.join("postings") }
    fn vectors_dir(&self) -> PathBuf { self.root.join("vectors") }
    fn texts_dir(&self) -> PathBuf { self.root.join("texts") }
    fn doc_id_map(&self) -> PathBuf { self.root.join("doc_id_map.bin") }
    pub fn kv_db(&self) -> PathBuf { self.root.join("kv") }

    fn postings_file(&self, term_id: TermId) -> PathBuf { self.postings_dir().join(format!("{term_id:08}.postings.bin")) }
    fn vector_file(&self, doc_id: DocId) -> PathBuf { self.vectors_dir().join(format!("{doc_id:08}.vec.bin")) }
    fn text_file(&self, doc_id: DocId) -> PathBuf { self.texts_dir().join(format!("{doc_id}.txt")) }

    /// Creates the segment subdirectories.
    pub fn create_layout(&self) -> Result<()> {
        create_dir_all(self.postings_dir())?;
        create_dir_all(self.vectors_dir())?;
        create_dir_all(self.texts_dir())?;
        Ok(())
    }
}

fn write_bincode<T: serde::Serialize + ?Sized>(path: PathBuf, value: &T) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut f, value)?;
    f.flush()?;
    Ok(())
}

fn read_bincode<T: serde::de::DeserializeOwned>(path: PathBuf) -> Result<T> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(bincode::deserialize(&buf)?)
}

pub fn save_dictionary(paths: &IndexPaths, dict: &Dictionary) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_bincode(paths.dictionary(), dict)
}

pub fn load_dictionary(paths: &IndexPaths) -> Result<Dictionary> {
    read_bincode(paths.dictionary())
}

/// Documents indexed by doc id.
pub fn save_docs(paths: &IndexPaths, docs: &[DocMeta]) -> Result<()> {
    write_bincode(paths.docs(), docs)
}

pub fn load_docs(paths: &IndexPaths) -> Result<Vec<DocMeta>> {
    read_bincode(paths.docs())
}

/// Appends one chunk of postings for a term. Chunks are written in doc id
/// order, so their concatenation stays sorted.
pub fn append_postings_for_term(paths: &IndexPaths, term_id: TermId, postings: &[Posting]) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(paths.postings_file(term_id))?;
    let mut w = BufWriter::new(file);
    bincode::serialize_into(&mut w, postings)?;
    w.flush()?;
    Ok(())
}

pub fn load_postings_for_term(paths: &IndexPaths, term_id: TermId) -> Result<Vec<Posting>> {
    let mut reader = BufReader::new(File::open(paths.postings_file(term_id))?);
    let mut postings = Vec::new();
    loop {
        match bincode::deserialize_from::<_, Vec<Posting>>(&mut reader) {
            Ok(chunk) => postings.extend(chunk),
            Err(e) => {
                if let bincode::ErrorKind::Io(io) = e.as_ref() {
                    if io.kind() == ErrorKind::UnexpectedEof { break; }
                }
                return Err(e.into());
            }
        }
    }
    Ok(postings)
}

pub fn save_vector(paths: &IndexPaths, doc_id: DocId, vector: &StoredDocVector) -> Result<()> {
    write_bincode(paths.vector_file(doc_id), vector)
}

/// A missing file is reported as [`Error::VectorRetrieval`].
pub fn load_vector(paths: &IndexPaths, doc_id: DocId) -> Result<StoredDocVector> {
    read_bincode(paths.vector_file(doc_id)).map_err(|e| match e {
        Error::Io(io) if io.kind() == ErrorKind::NotFound => Error::vector(doc_id, "no stored vector"),
        other => other,
    })
}

pub fn save_text(paths: &IndexPaths, doc_id: DocId, text: &str) -> Result<()> {
    std::fs::write(paths.text_file(doc_id), text)?;
    Ok(())
}

pub fn load_text(paths: &IndexPaths, doc_id: DocId) -> Result<String> {
    Ok(std::fs::read_to_string(paths.text_file(doc_id))?)
}

pub fn save_meta(paths: &IndexPaths, meta: &IndexMeta) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<IndexMeta> {
    let mut f = File::open(paths.meta())
        .map_err(|e| Error::Storage(format!("no index metadata under {}: {e}", paths.root.display())))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: IndexMeta = serde_json::from_str(&buf)?;
    Ok(meta)
}

pub fn save_doc_id_map(paths: &IndexPaths, map: &HashMap<String, DocId>) -> Result<()> {
    write_bincode(paths.doc_id_map(), map)
}

pub fn load_doc_id_map(paths: &IndexPaths) -> Result<HashMap<String, DocId>> {
    read_bincode(paths.doc_id_map())
}

/// Everything a segment reader keeps in memory: dictionary with term stats,
/// documents and the docno map.
pub fn load_index_header(paths: &IndexPaths) -> Result<(Dictionary, Vec<DocMeta>, HashMap<String, DocId>)> {
    let dict = load_dictionary(paths)?;
    let docs = load_docs(paths)?;
    let ids = load_doc_id_map(paths)?;
    Ok((dict, docs, ids))
}

//! Readers for the supported corpus formats.

use std::path::{Path, PathBuf};

use irkit_core::{CorpusFormat, CorpusReader, Error, RawDocument, Result};
use walkdir::WalkDir;

pub mod json;
pub mod trec;
pub mod wiki;

pub use json::JsonReader;
pub use trec::TrecTextReader;
pub use wiki::WikiReader;

/// Reader for a format tag that already parsed.
pub fn reader_for(format: CorpusFormat) -> Box<dyn CorpusReader> {
    match format {
        CorpusFormat::TrecText => Box::new(TrecTextReader),
        CorpusFormat::Wiki => Box::new(WikiReader),
        CorpusFormat::Json => Box::new(JsonReader),
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name().and_then(|s| s.to_str()).is_some_and(|s| s.starts_with('.'))
}

/// Files under `root` in file-name order. A root that is itself a file is
/// returned as is; otherwise only files with one of `extensions` are kept
/// (`None` keeps every non-hidden file).
pub(crate) fn corpus_files(root: &Path, extensions: Option<&[&str]>) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(Error::Corpus(format!("corpus path {} does not exist", root.display())));
    }
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Corpus(e.to_string()))?;
        let p = entry.path();
        if !entry.file_type().is_file() || is_hidden(p) { continue; }
        let keep = match extensions {
            None => true,
            Some(exts) => p.extension().and_then(|s| s.to_str()).is_some_and(|ext| exts.contains(&ext)),
        };
        if keep {
            files.push(p.to_path_buf());
        } else {
            tracing::debug!(file = %p.display(), "skipping file with unrecognized extension");
        }
    }
    if files.is_empty() {
        tracing::warn!(root = %root.display(), "no corpus files found");
    }
    Ok(files)
}

/// Streams the documents of each file in turn, reading one file at a time.
pub(crate) fn stream_files<'a, F>(files: Vec<PathBuf>, parse: F) -> Box<dyn Iterator<Item = Result<RawDocument>> + 'a>
where
    F: Fn(&Path) -> Vec<Result<RawDocument>> + 'a,
{
    Box::new(files.into_iter().flat_map(move |path| {
        tracing::debug!(file = %path.display(), "reading corpus file");
        parse(&path)
    }))
}

pub(crate) fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::Corpus(format!("reading {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn files_are_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.txt"), "x").unwrap();
        fs::write(dir.path().join("a.txt"), "x").unwrap();
        fs::write(dir.path().join("sub/c.txt"), "x").unwrap();
        fs::write(dir.path().join("skip.bin"), "x").unwrap();
        fs::write(dir.path().join(".hidden.txt"), "x").unwrap();
        let files = corpus_files(dir.path(), Some(&["txt"])).unwrap();
        let names: Vec<_> = files.iter().map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf()).collect();
        assert_eq!(names, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt"), PathBuf::from("sub/c.txt")]);
        assert_eq!(corpus_files(dir.path(), None).unwrap().len(), 4);
    }

    #[test]
    fn missing_root_is_a_corpus_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(corpus_files(&dir.path().join("nope"), None), Err(Error::Corpus(_))));
    }
}

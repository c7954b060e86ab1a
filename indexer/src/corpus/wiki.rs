//! One article per `.txt` or `.wiki` file. The file stem is the docno, the
//! first non-empty line the title and everything after it the body.

use std::path::Path;

use irkit_core::{CorpusReader, DocumentStream, Error, RawDocument, Result};

use crate::corpus::{corpus_files, read_file, stream_files};

const EXTENSIONS: &[&str] = &["txt", "wiki"];

#[derive(Debug, Default, Clone, Copy)]
pub struct WikiReader;

pub fn parse_article(content: &str, path: &Path) -> Result<RawDocument> {
    let docno = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Corpus(format!("{}: cannot derive a docno from the file name", path.display())))?;
    let mut doc = RawDocument::new(docno);

    let mut lines = content.lines().skip_while(|l| l.trim().is_empty());
    if let Some(title) = lines.next() {
        doc = doc.with_field("title", title.trim());
    }
    let body = lines.collect::<Vec<_>>().join("\n");
    let body = body.trim();
    if !body.is_empty() {
        doc = doc.with_field("text", body);
    }
    Ok(doc)
}

impl CorpusReader for WikiReader {
    fn documents<'a>(&'a self, root: &Path) -> Result<DocumentStream<'a>> {
        let files = corpus_files(root, Some(EXTENSIONS))?;
        tracing::info!(root = %root.display(), files = files.len(), format = "wiki", "opening corpus");
        Ok(stream_files(files, |path| vec![read_file(path).and_then(|content| parse_article(&content, path))]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_first_non_empty_line() {
        let doc = parse_article("\n\n  Rust (language)\nRust is a language.\n\nIt has traits.\n", Path::new("x/Rust.wiki")).unwrap();
        assert_eq!(doc.docno, "Rust");
        assert_eq!(doc.field("title"), Some("Rust (language)"));
        assert_eq!(doc.field("text"), Some("Rust is a language.\n\nIt has traits."));
    }

    #[test]
    fn empty_article_still_counts() {
        let doc = parse_article("", Path::new("Empty.txt")).unwrap();
        assert_eq!(doc.docno, "Empty");
        assert!(doc.fields.is_empty());
    }
}

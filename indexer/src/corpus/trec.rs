//! TREC SGML: `<DOC>` blocks with a `<DOCNO>`, optional headline and one or
//! more `<TEXT>` sections. Files may hold many documents and usually carry no
//! extension.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use irkit_core::{CorpusReader, DocumentStream, Error, RawDocument, Result};

use crate::corpus::{corpus_files, read_file, stream_files};

lazy_static! {
    static ref DOC: Regex = Regex::new(r"(?is)<DOC>(.*?)</DOC>").expect("valid regex");
    static ref DOCNO: Regex = Regex::new(r"(?is)<DOCNO>\s*(.*?)\s*</DOCNO>").expect("valid regex");
    static ref TITLE: Regex =
        Regex::new(r"(?is)<(?:HEAD|HEADLINE|TITLE)>(.*?)</(?:HEAD|HEADLINE|TITLE)>").expect("valid regex");
    static ref TEXT: Regex = Regex::new(r"(?is)<TEXT>(.*?)</TEXT>").expect("valid regex");
    static ref TAG: Regex = Regex::new(r"<[^>]*>").expect("valid regex");
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TrecTextReader;

fn clean(raw: &str) -> String {
    TAG.replace_all(raw, " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn joined(re: &Regex, body: &str, sep: &str) -> Option<String> {
    let parts: Vec<String> = re
        .captures_iter(body)
        .map(|c| clean(&c[1]))
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() { None } else { Some(parts.join(sep)) }
}

/// Parses every `<DOC>` in `content`. A document without a DOCNO is an error
/// in place of that document; its neighbours still parse.
pub fn parse_trec(content: &str, origin: &Path) -> Vec<Result<RawDocument>> {
    DOC.captures_iter(content)
        .enumerate()
        .map(|(n, cap)| -> Result<RawDocument> {
            let body = &cap[1];
            let docno = DOCNO
                .captures(body)
                .map(|c| c[1].trim().to_string())
                .filter(|d| !d.is_empty())
                .ok_or_else(|| Error::Corpus(format!("{}: document #{} has no DOCNO", origin.display(), n + 1)))?;
            let mut doc = RawDocument::new(docno);
            if let Some(title) = joined(&TITLE, body, " ") {
                doc = doc.with_field("title", title);
            }
            if let Some(text) = joined(&TEXT, body, "\n") {
                doc = doc.with_field("text", text);
            }
            Ok(doc)
        })
        .collect()
}

impl CorpusReader for TrecTextReader {
    fn documents<'a>(&'a self, root: &Path) -> Result<DocumentStream<'a>> {
        let files = corpus_files(root, None)?;
        tracing::info!(root = %root.display(), files = files.len(), format = "trec-text", "opening corpus");
        Ok(stream_files(files, |path| match read_file(path) {
            Ok(content) => parse_trec(&content, path),
            Err(e) => vec![Err(e)],
        }))
    }
}

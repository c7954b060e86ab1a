//! `.json` files holding one document object or an array of them, and
//! `.jsonl` files with one object per line.

use serde::Deserialize;
use std::path::Path;

use irkit_core::{CorpusReader, DocumentStream, Error, RawDocument, Result};

use crate::corpus::{corpus_files, read_file, stream_files};

const EXTENSIONS: &[&str] = &["json", "jsonl"];

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    #[serde(default)]
    title: Option<String>,
    body: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl From<InputDoc> for RawDocument {
    fn from(d: InputDoc) -> Self {
        let mut doc = RawDocument::new(d.id).with_field("text", d.body);
        for (name, value) in [("title", d.title), ("url", d.url), ("timestamp", d.timestamp)] {
            if let Some(v) = value {
                doc = doc.with_field(name, v);
            }
        }
        doc
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReader;

fn bad(path: &Path, at: &str, e: impl std::fmt::Display) -> Error {
    Error::Corpus(format!("{}{at}: {e}", path.display()))
}

pub fn parse_jsonl(content: &str, path: &Path) -> Vec<Result<RawDocument>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str::<InputDoc>(line)
                .map(RawDocument::from)
                .map_err(|e| bad(path, &format!(":{}", n + 1), e))
        })
        .collect()
}

pub fn parse_json(content: &str, path: &Path) -> Vec<Result<RawDocument>> {
    let json: serde_json::Value = match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => return vec![Err(bad(path, "", e))],
    };
    let values = match json {
        serde_json::Value::Array(arr) => arr,
        v @ serde_json::Value::Object(_) => vec![v],
        _ => return vec![Err(bad(path, "", "expected a document object or an array of them"))],
    };
    values
        .into_iter()
        .enumerate()
        .map(|(n, v)| {
            serde_json::from_value::<InputDoc>(v)
                .map(RawDocument::from)
                .map_err(|e| bad(path, &format!("[{n}]"), e))
        })
        .collect()
}

impl CorpusReader for JsonReader {
    fn documents<'a>(&'a self, root: &Path) -> Result<DocumentStream<'a>> {
        let files = corpus_files(root, Some(EXTENSIONS))?;
        tracing::info!(root = %root.display(), files = files.len(), format = "json", "opening corpus");
        Ok(stream_files(files, |path| {
            let content = match read_file(path) {
                Ok(c) => c,
                Err(e) => return vec![Err(e)],
            };
            if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                parse_jsonl(&content, path)
            } else {
                parse_json(&content, path)
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_and_object_files() {
        let arr = r#"[{"id": "a", "title": "A", "body": "alpha", "url": "http://a"}, {"id": "b", "body": "beta"}]"#;
        let docs: Vec<RawDocument> = parse_json(arr, Path::new("x.json")).into_iter().map(|d| d.unwrap()).collect();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].field("url"), Some("http://a"));
        assert_eq!(docs[1].field("title"), None);
        assert_eq!(docs[1].field("text"), Some("beta"));

        let obj = parse_json(r#"{"id": "c", "body": "gamma"}"#, Path::new("c.json"));
        assert_eq!(obj[0].as_ref().unwrap().docno, "c");
        assert!(matches!(&parse_json("42", Path::new("n.json"))[0], Err(Error::Corpus(_))));
    }

    #[test]
    fn jsonl_skips_blank_lines_and_names_the_bad_one() {
        let content = "{\"id\": \"1\", \"body\": \"one\"}\n\n{\"id\": \"2\"}\n";
        let docs = parse_jsonl(content, Path::new("d.jsonl"));
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].as_ref().unwrap().docno, "1");
        assert!(matches!(&docs[1], Err(Error::Corpus(m)) if m.contains("d.jsonl:3")));
    }
}

//! Build configuration, loaded from YAML.
//!
//! ```yaml
//! indexPath: /data/index/ap88
//! stopwords: /data/stoplist.txt
//! analyzer: english
//! similarity: bm25
//! corpus:
//!   path: /data/corpus/ap88
//!   type: trec-text
//! fields:
//!   - name: text
//!   - name: title
//!     stored: true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::index::BackendKind;

pub const DEFAULT_RAM_BUFFER_MB: usize = 256;
pub const DEFAULT_FIELD: &str = "text";

fn yes() -> bool { true }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    #[serde(default, alias = "processorRef", skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<PathBuf>,
    #[serde(default = "yes")]
    pub indexed: bool,
    #[serde(default)]
    pub stored: bool,
    #[serde(default = "yes")]
    pub tokenized: bool,
}

impl FieldSpec {
    /// Indexed, tokenized, not stored, no override.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), analyzer: None, stopwords: None, indexed: true, stored: false, tokenized: true }
    }

    pub fn has_override(&self) -> bool {
        self.analyzer.as_deref().is_some_and(|a| !a.trim().is_empty()) || self.stopwords.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusConfig {
    pub path: PathBuf,
    /// Format tag, checked against [`CorpusFormat`] when the build starts.
    #[serde(rename = "type")]
    pub format: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorpusFormat {
    TrecText,
    Wiki,
    Json,
}

impl CorpusFormat {
    pub const ALL: [CorpusFormat; 3] = [CorpusFormat::TrecText, CorpusFormat::Wiki, CorpusFormat::Json];

    pub fn tag(self) -> &'static str {
        match self {
            CorpusFormat::TrecText => "trec-text",
            CorpusFormat::Wiki => "wiki",
            CorpusFormat::Json => "json",
        }
    }
}

impl FromStr for CorpusFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "trec-text" | "trectext" | "trec" => Ok(CorpusFormat::TrecText),
            "wiki" => Ok(CorpusFormat::Wiki),
            "json" | "jsonl" => Ok(CorpusFormat::Json),
            _ => Err(Error::UnsupportedCorpusFormat(s.to_string())),
        }
    }
}

impl fmt::Display for CorpusFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.tag()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexBuildConfig {
    pub index_path: PathBuf,
    pub corpus: CorpusConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<PathBuf>,
    #[serde(default, alias = "processorRef", skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    #[serde(default, alias = "scoringRef", skip_serializing_if = "Option::is_none")]
    pub similarity: Option<String>,
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_ram_buffer_mb")]
    pub ram_buffer_mb: usize,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

fn default_ram_buffer_mb() -> usize { DEFAULT_RAM_BUFFER_MB }

impl IndexBuildConfig {
    pub fn new(index_path: impl Into<PathBuf>, corpus_path: impl Into<PathBuf>, format: &str) -> Self {
        Self {
            index_path: index_path.into(),
            corpus: CorpusConfig { path: corpus_path.into(), format: format.to_string() },
            stopwords: None,
            analyzer: None,
            similarity: None,
            backend: BackendKind::default(),
            ram_buffer_mb: DEFAULT_RAM_BUFFER_MB,
            fields: Vec::new(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut config: IndexBuildConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_yaml_str(&yaml)
    }

    /// Rejects duplicate field names and fills in the default field list.
    pub fn validate(&mut self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(Error::Config("field with empty name".into()));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::Config(format!("duplicate field: {}", field.name)));
            }
        }
        if self.fields.is_empty() {
            self.fields.push(FieldSpec::named(DEFAULT_FIELD));
        }
        if self.ram_buffer_mb == 0 {
            return Err(Error::Config("ramBufferMb must be positive".into()));
        }
        Ok(())
    }

    pub fn corpus_format(&self) -> Result<CorpusFormat> { self.corpus.format.parse() }

    pub fn ram_buffer_bytes(&self) -> usize { self.ram_buffer_mb.saturating_mul(1024 * 1024) }
}

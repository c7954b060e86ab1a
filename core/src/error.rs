use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or reading an index.
#[derive(Error, Debug)]
pub enum Error {
    /// The corpus `type` tag is not one of the supported formats
    #[error("unsupported corpus format: {0}")]
    UnsupportedCorpusFormat(String),

    /// No processor is registered under this name
    #[error("unknown processor: {0}")]
    UnknownProcessor(String),

    /// The processor exists but cannot be built with the requested profile
    #[error("cannot construct processor {name}: {reason}")]
    ProcessorConstruction { name: String, reason: String },

    /// No scoring function is registered under this name
    #[error("unknown scoring function: {0}")]
    UnknownScoringFunction(String),

    /// The docno (or doc id) does not resolve to a document
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// The backend holds no usable vector for the document
    #[error("cannot retrieve document vector for doc {doc_id}: {reason}")]
    VectorRetrieval { doc_id: u32, reason: String },

    /// Failure while writing index data
    #[error("index writer I/O error: {0}")]
    WriterIo(String),

    /// Another build holds the output location; carries the lock file
    #[error("index location is locked by {} (remove it if no build is running)", .0.display())]
    IndexLocked(PathBuf),

    /// Invalid or unreadable build configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed corpus input
    #[error("corpus error: {0}")]
    Corpus(String),

    /// Failure reading persisted index data
    #[error("storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn processor(name: &str, reason: impl Into<String>) -> Self {
        Error::ProcessorConstruction { name: name.to_string(), reason: reason.into() }
    }

    pub(crate) fn vector(doc_id: u32, reason: impl Into<String>) -> Self {
        Error::VectorRetrieval { doc_id, reason: reason.into() }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<sled::Error> for Error {
    fn from(err: sled::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use docqa_document_store::StoreError;
use docqa_vector_store::VectorStoreError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RetrievalError>;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Content is empty")]
    EmptyContent,

    #[error("Query cannot be empty")]
    EmptyQuery,

    #[error("k must be between 1 and {max}, got {k}")]
    InvalidK { k: usize, max: usize },

    #[error("Only {expected} files are supported. Invalid file: {name}")]
    UnsupportedFile { name: String, expected: String },

    #[error("File must contain valid UTF-8 text: {name}")]
    InvalidUtf8 { name: String },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Query embedding failed: {0}")]
    Embedding(#[source] VectorStoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid retrieval configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

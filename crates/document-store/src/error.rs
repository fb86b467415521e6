use docqa_vector_store::VectorStoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document content is empty")]
    EmptyContent,

    #[error("Invalid k: {0} (must be at least 1)")]
    InvalidK(usize),

    #[error("Store at {path} is locked by another process")]
    Locked { path: String },

    #[error("Embedding failed: {0}")]
    Embedding(#[source] VectorStoreError),

    #[error("Vector index error: {0}")]
    Index(#[from] VectorStoreError),

    #[error("Failed to write metadata {path}: {source}")]
    Metadata {
        path: String,
        #[source]
        source: VectorStoreError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("Index and records out of step: {0}")]
    Inconsistent(String),

    #[error("{0}")]
    Other(String),
}

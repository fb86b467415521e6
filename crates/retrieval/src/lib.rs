//! Ingestion and retrieval on top of a [`docqa_document_store::DocumentStore`].
//!
//! [`Ingestor`] validates input (blank text, file extension, UTF-8), detects
//! the language and stores the text. [`Retriever`] validates the query and
//! `k`, embeds the query with the store's embedder and turns hits into
//! single-line snippets.

mod config;
mod error;
mod ingest;
mod language;
mod retrieve;
mod snippet;

pub use config::{
    IngestConfig, RetrievalConfig, ALLOWED_FILE_EXTENSION, DEFAULT_K, ENV_DEFAULT_K, ENV_MAX_K,
    ENV_SNIPPET_MAX_CHARS, ENV_SNIPPET_WORD_BOUNDARY, MAX_K,
};
pub use error::{Result, RetrievalError};
pub use ingest::{BatchOutcome, IngestOutcome, Ingestor};
pub use language::{LanguageDetector, DEFAULT_LANGUAGE_THRESHOLD, LANG_ENGLISH, LANG_JAPANESE};
pub use retrieve::{RetrievedDocument, Retriever};
pub use snippet::{
    format_snippet, SnippetConfig, DEFAULT_SNIPPET_MAX_CHARS, DEFAULT_WORD_BOUNDARY_THRESHOLD,
};

use crate::identity::ContentHash;
use serde::{Deserialize, Serialize};

/// One stored document. Record `i` always owns vector handle `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub doc_id: String,
    pub content_hash: ContentHash,
    pub language: String,
    pub content: String,
    pub vector_handle: usize,
}

/// Result of [`DocumentStore::add`](crate::DocumentStore::add).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    pub doc_id: String,
    pub content_hash: ContentHash,
    /// `false` when the content was already stored and nothing changed
    pub added: bool,
}

impl AddOutcome {
    pub(crate) fn existing(record: &DocumentRecord) -> Self {
        Self {
            doc_id: record.doc_id.clone(),
            content_hash: record.content_hash.clone(),
            added: false,
        }
    }

    pub(crate) fn inserted(record: &DocumentRecord) -> Self {
        Self {
            added: true,
            ..Self::existing(record)
        }
    }
}

/// A ranked search result. Lower `score` means closer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f32,
    pub language: String,
    pub content: String,
}

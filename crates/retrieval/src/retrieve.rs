use crate::config::RetrievalConfig;
use crate::error::{Result, RetrievalError};
use crate::snippet::format_snippet;
use docqa_document_store::DocumentStore;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedDocument {
    pub doc_id: String,
    pub score: f32,
    pub snippet: String,
    pub language: String,
}

pub struct Retriever {
    store: Arc<DocumentStore>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(store: Arc<DocumentStore>, config: RetrievalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    #[must_use]
    pub const fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Top `k` documents for `query` (`default_k` when `None`), with snippets.
    pub async fn retrieve(&self, query: &str, k: Option<usize>) -> Result<Vec<RetrievedDocument>> {
        if query.trim().is_empty() {
            return Err(RetrievalError::EmptyQuery);
        }
        let k = k.unwrap_or(self.config.default_k);
        if k == 0 || k > self.config.max_k {
            return Err(RetrievalError::InvalidK {
                k,
                max: self.config.max_k,
            });
        }
        if self.store.size() == 0 {
            return Ok(Vec::new());
        }

        let vector = self
            .store
            .embedder()
            .embed(query)
            .await
            .map_err(RetrievalError::Embedding)?;
        let hits = self.store.search(&vector, k).await?;
        log::debug!("Query matched {} documents (k={k})", hits.len());

        Ok(hits
            .into_iter()
            .map(|hit| RetrievedDocument {
                snippet: format_snippet(&hit.content, &self.config.snippet),
                doc_id: hit.doc_id,
                score: hit.score,
                language: hit.language,
            })
            .collect())
    }
}

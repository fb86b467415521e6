use crate::config::DocqaConfig;
use anyhow::{Context, Result};
use docqa_document_store::DocumentStore;
use docqa_protocol::{
    IngestBatchResponse, IngestResponse, RetrieveResponse, RetrieveResult, StatsResponse,
    PROTOCOL_SCHEMA_VERSION,
};
use docqa_retrieval::{IngestOutcome, Ingestor, Retriever};
use docqa_vector_store::{Embedder, EmbeddingModel};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// A single file answers with one result, several with a summary.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum IngestReply {
    Single(IngestResponse),
    Batch(IngestBatchResponse),
}

/// One opened store plus the adapters that front it.
pub struct App {
    store: Arc<DocumentStore>,
    ingestor: Ingestor,
    retriever: Retriever,
}

impl App {
    pub async fn open(config: &DocqaConfig) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(
            EmbeddingModel::from_config(&config.embedding)
                .context("Failed to initialize embedding model")?,
        );
        let store = Arc::new(
            DocumentStore::open(config.store.clone(), embedder)
                .await
                .with_context(|| {
                    format!("Failed to open store in {}", config.store.data_dir.display())
                })?,
        );
        let ingestor = Ingestor::new(store.clone(), config.ingest.clone())?;
        let retriever = Retriever::new(store.clone(), config.retrieval.clone())?;
        Ok(Self {
            store,
            ingestor,
            retriever,
        })
    }

    pub async fn ingest_text(&self, text: &str) -> Result<IngestReply> {
        let outcome = self.ingestor.ingest_text(text).await?;
        Ok(IngestReply::Single(to_response(outcome)))
    }

    pub async fn ingest_files(&self, files: &[PathBuf]) -> Result<IngestReply> {
        if let [file] = files {
            let outcome = self.ingestor.ingest_file(file).await?;
            return Ok(IngestReply::Single(to_response(outcome)));
        }
        let batch = self.ingestor.ingest_files(files).await?;
        Ok(IngestReply::Batch(IngestBatchResponse {
            files_processed: batch.files_processed,
            results: batch.results.into_iter().map(to_response).collect(),
            index_size: batch.index_size,
        }))
    }

    pub async fn retrieve(&self, query: &str, k: Option<usize>) -> Result<RetrieveResponse> {
        let documents = self.retriever.retrieve(query, k).await?;
        Ok(RetrieveResponse {
            results: documents
                .into_iter()
                .map(|doc| RetrieveResult {
                    doc_id: doc.doc_id,
                    score: doc.score,
                    snippet: doc.snippet,
                    language: doc.language,
                })
                .collect(),
        })
    }

    pub async fn stats(&self) -> StatsResponse {
        let stats = self.store.stats().await;
        StatsResponse {
            schema_version: PROTOCOL_SCHEMA_VERSION,
            documents: stats.documents,
            dimension: stats.dimension,
            index_kind: stats.index_kind.to_string(),
            embedding_model: self.store.embedder().model_id().to_string(),
            languages: stats.languages,
            data_dir: stats.data_dir.display().to_string(),
        }
    }
}

fn to_response(outcome: IngestOutcome) -> IngestResponse {
    IngestResponse {
        doc_id: outcome.doc_id,
        language: outcome.language,
        added: outcome.added,
        index_size: outcome.index_size,
        filename: outcome.filename,
    }
}

use crate::config::IngestConfig;
use crate::error::{Result, RetrievalError};
use crate::language::LanguageDetector;
use docqa_document_store::DocumentStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub doc_id: String,
    pub language: String,
    pub added: bool,
    /// Store size right after this document was handled
    pub index_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub files_processed: usize,
    pub results: Vec<IngestOutcome>,
    pub index_size: usize,
}

/// Validates raw input, tags its language and hands it to the store.
pub struct Ingestor {
    store: Arc<DocumentStore>,
    detector: LanguageDetector,
    config: IngestConfig,
}

impl Ingestor {
    pub fn new(store: Arc<DocumentStore>, config: IngestConfig) -> Result<Self> {
        let detector = LanguageDetector::new(config.language_threshold)?;
        Ok(Self {
            store,
            detector,
            config,
        })
    }

    pub async fn ingest_text(&self, text: &str) -> Result<IngestOutcome> {
        if text.trim().is_empty() {
            return Err(RetrievalError::EmptyContent);
        }
        let language = self.detector.detect_language(text);
        let outcome = self.store.add(text, language).await?;
        log::debug!(
            "Ingested {} (language {language}, added {})",
            outcome.doc_id,
            outcome.added
        );
        Ok(IngestOutcome {
            doc_id: outcome.doc_id,
            language: language.to_string(),
            added: outcome.added,
            index_size: self.store.size(),
            filename: None,
        })
    }

    /// Ingests one text file. Only names ending in the configured extension
    /// are accepted, and the bytes must be UTF-8.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestOutcome> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if !name.ends_with(&self.config.allowed_extension) {
            return Err(RetrievalError::UnsupportedFile {
                name,
                expected: self.config.allowed_extension.clone(),
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| RetrievalError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let text =
            String::from_utf8(bytes).map_err(|_| RetrievalError::InvalidUtf8 { name: name.clone() })?;

        let mut outcome = self.ingest_text(&text).await?;
        outcome.filename = Some(name);
        Ok(outcome)
    }

    /// Ingests files in order, stopping at the first failure. Files before
    /// the failing one stay stored.
    pub async fn ingest_files(&self, paths: &[impl AsRef<Path>]) -> Result<BatchOutcome> {
        if paths.is_empty() {
            return Err(RetrievalError::Other(
                "At least one file is required".to_string(),
            ));
        }
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            results.push(self.ingest_file(path.as_ref()).await?);
        }
        log::info!(
            "Ingested {} files ({} new)",
            results.len(),
            results.iter().filter(|r| r.added).count()
        );
        Ok(BatchOutcome {
            files_processed: results.len(),
            results,
            index_size: self.store.size(),
        })
    }
}

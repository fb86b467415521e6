use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::identity::{compute_identity, ContentHash};
use crate::persist::{
    clear_artifacts, discard_artifacts, load_state, save_state, RecoveryOutcome,
};
use crate::ranking::{candidate_count, rank_neighbors};
use crate::record::{AddOutcome, DocumentRecord, SearchHit};
use crate::stats::StoreStats;
use crate::store_lock::{acquire_store_lock, StoreLock};
use docqa_vector_store::{Embedder, StorePaths, VectorIndex};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

struct StoreState {
    index: Option<Box<dyn VectorIndex>>,
    records: Vec<DocumentRecord>,
    by_hash: HashMap<ContentHash, usize>,
}

impl StoreState {
    fn new(index: Option<Box<dyn VectorIndex>>, records: Vec<DocumentRecord>) -> Self {
        let by_hash = records
            .iter()
            .enumerate()
            .map(|(ordinal, record)| (record.content_hash.clone(), ordinal))
            .collect();
        Self {
            index,
            records,
            by_hash,
        }
    }

    fn find_by_hash(&self, hash: &ContentHash) -> Option<&DocumentRecord> {
        self.by_hash
            .get(hash)
            .and_then(|&ordinal| self.records.get(ordinal))
    }

    /// Undoes a tentative append so memory matches the last committed state.
    fn rollback(&mut self, committed_len: usize, drop_index: bool) {
        for record in self.records.drain(committed_len..) {
            self.by_hash.remove(&record.content_hash);
        }
        if drop_index {
            self.index = None;
        } else if let Some(index) = self.index.as_mut() {
            index.truncate(committed_len);
        }
    }
}

/// Deduplicated, persisted document collection with ranked vector search.
///
/// Construct once with [`DocumentStore::open`] and share behind an `Arc`.
/// Searches run concurrently; adds are serialized, and each add is durable
/// on disk before it returns.
pub struct DocumentStore {
    config: StoreConfig,
    paths: StorePaths,
    embedder: Arc<dyn Embedder>,
    state: RwLock<StoreState>,
    size: AtomicUsize,
    recovery: RecoveryOutcome,
    _lock: StoreLock,
}

impl DocumentStore {
    /// Opens (or creates) the store in `config.data_dir`.
    ///
    /// Fails with [`StoreError::Locked`] if another process holds the
    /// directory. Unusable artifacts are not an error: they are renamed with a
    /// `.discarded` suffix, the store starts empty and [`Self::recovery`]
    /// reports why.
    pub async fn open(config: StoreConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        config.validate()?;
        let paths = config.paths();
        tokio::fs::create_dir_all(&paths.data_dir).await?;
        let lock = acquire_store_lock(&paths.lock).await?;

        let (loaded, recovery) = load_state(&paths, embedder.dimension()).await;
        match &recovery {
            RecoveryOutcome::Fresh => {
                log::info!("Starting empty store in {}", paths.data_dir.display());
            }
            RecoveryOutcome::Restored { documents } => {
                log::info!(
                    "Restored {documents} documents from {}",
                    paths.data_dir.display()
                );
            }
            RecoveryOutcome::Reset { reason } => {
                log::warn!(
                    "Discarding persisted store in {}: {reason}",
                    paths.data_dir.display()
                );
                discard_artifacts(&paths).await?;
            }
        }
        if let Some(index) = loaded.index.as_ref() {
            if index.kind() != config.index_kind {
                log::warn!(
                    "Persisted index is {} but {} is configured; keeping {}",
                    index.kind(),
                    config.index_kind,
                    index.kind()
                );
            }
        }

        let size = AtomicUsize::new(loaded.records.len());
        Ok(Self {
            config,
            paths,
            embedder,
            state: RwLock::new(StoreState::new(loaded.index, loaded.records)),
            size,
            recovery,
            _lock: lock,
        })
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The embedder used for documents; queries must be embedded with it too.
    #[must_use]
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    #[must_use]
    pub fn recovery(&self) -> &RecoveryOutcome {
        &self.recovery
    }

    /// Stores `content` unless identical bytes are already present.
    ///
    /// Re-adding existing content returns the original `doc_id` with
    /// `added: false` and touches neither the index nor the disk.
    pub async fn add(&self, content: &str, language: &str) -> Result<AddOutcome> {
        if content.trim().is_empty() {
            return Err(StoreError::EmptyContent);
        }
        let content_hash = compute_identity(content);

        {
            let state = self.state.read().await;
            if let Some(existing) = state.find_by_hash(&content_hash) {
                log::debug!("Content {content_hash} already stored as {}", existing.doc_id);
                return Ok(AddOutcome::existing(existing));
            }
        }

        let vector = self
            .embedder
            .embed(content)
            .await
            .map_err(StoreError::Embedding)?;

        let mut state = self.state.write().await;
        // Another add may have committed the same content while we embedded.
        if let Some(existing) = state.find_by_hash(&content_hash) {
            log::debug!("Content {content_hash} was stored concurrently as {}", existing.doc_id);
            return Ok(AddOutcome::existing(existing));
        }

        let ordinal = state.records.len();
        let created_index = state.index.is_none();
        let kind = self.config.index_kind;
        let dimension = self.embedder.dimension();
        let index = state
            .index
            .get_or_insert_with(|| kind.build(dimension));

        let handle = match index.add(&vector) {
            Ok(handle) => handle,
            Err(err) => {
                state.rollback(ordinal, created_index);
                return Err(err.into());
            }
        };
        if handle != ordinal {
            state.rollback(ordinal, created_index);
            return Err(StoreError::Inconsistent(format!(
                "index returned handle {handle} for record {ordinal}"
            )));
        }
        if created_index {
            log::info!("Created {kind} index with dimension {dimension}");
        }

        let record = DocumentRecord {
            doc_id: format!("{}{ordinal}", self.config.doc_id_prefix),
            content_hash: content_hash.clone(),
            language: language.to_string(),
            content: content.to_string(),
            vector_handle: handle,
        };
        let outcome = AddOutcome::inserted(&record);
        state.records.push(record);
        state.by_hash.insert(content_hash, ordinal);

        if let Err(err) = self.persist(&state).await {
            log::warn!("Persisting {} failed, rolling back: {err}", outcome.doc_id);
            state.rollback(ordinal, created_index);
            self.restore_disk(&state).await;
            return Err(err);
        }

        self.size.store(state.records.len(), Ordering::Release);
        log::debug!("Stored {} ({} documents)", outcome.doc_id, state.records.len());
        Ok(outcome)
    }

    /// Returns up to `k` documents nearest to `query`, closest first.
    ///
    /// Equal scores are ordered by `doc_id`. An empty store returns no
    /// results without consulting the index.
    pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(StoreError::InvalidK(k));
        }

        let state = self.state.read().await;
        let total = state.records.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let Some(index) = state.index.as_ref() else {
            return Err(StoreError::Inconsistent(format!(
                "{total} records but no index"
            )));
        };

        let limit = candidate_count(k, self.config.overfetch_factor, total);
        let neighbors = index.search(query, limit)?;
        log::debug!(
            "Index returned {} of {limit} requested candidates",
            neighbors.len()
        );
        Ok(rank_neighbors(&state.records, neighbors, k))
    }

    /// Number of stored documents.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        let mut languages = BTreeMap::new();
        for record in &state.records {
            *languages.entry(record.language.clone()).or_insert(0) += 1;
        }
        StoreStats {
            documents: state.records.len(),
            dimension: state.index.as_ref().map(|index| index.dimension()),
            index_kind: state
                .index
                .as_ref()
                .map_or(self.config.index_kind, |index| index.kind()),
            languages,
            data_dir: self.paths.data_dir.clone(),
        }
    }

    async fn persist(&self, state: &StoreState) -> Result<()> {
        let Some(index) = state.index.as_ref() else {
            return Err(StoreError::Inconsistent(
                "nothing to persist without an index".to_string(),
            ));
        };
        save_state(&self.paths, index.as_ref(), &state.records).await
    }

    /// Best effort: puts the last committed state back on disk after a failed
    /// commit left the index one vector ahead. With no committed index the
    /// directory is cleared instead.
    async fn restore_disk(&self, state: &StoreState) {
        let restored = match state.index.as_ref() {
            Some(index) => save_state(&self.paths, index.as_ref(), &state.records).await,
            None => clear_artifacts(&self.paths).await,
        };
        if let Err(err) = restored {
            log::warn!(
                "Could not restore committed state in {}: {err}",
                self.paths.data_dir.display()
            );
        }
    }
}

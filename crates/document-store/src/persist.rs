use crate::error::{Result, StoreError};
use crate::record::DocumentRecord;
use docqa_vector_store::{read_index, write_atomic, write_index, StorePaths, VectorIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const METADATA_SCHEMA_VERSION: u32 = 1;

const DISCARDED_SUFFIX: &str = ".discarded";

#[derive(Deserialize)]
struct PersistedMetadata {
    schema_version: u32,
    records: Vec<DocumentRecord>,
}

#[derive(Serialize)]
struct PersistedMetadataRef<'a> {
    schema_version: u32,
    records: &'a [DocumentRecord],
}

/// What happened when a store opened its data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// No artifacts on disk.
    Fresh,
    /// Index and records loaded together.
    Restored { documents: usize },
    /// Artifacts were unusable and the store started empty.
    Reset { reason: String },
}

pub(crate) struct LoadedState {
    pub(crate) index: Option<Box<dyn VectorIndex>>,
    pub(crate) records: Vec<DocumentRecord>,
}

impl LoadedState {
    const fn empty() -> Self {
        Self {
            index: None,
            records: Vec::new(),
        }
    }
}

pub(crate) async fn write_metadata(path: &Path, records: &[DocumentRecord]) -> Result<()> {
    let payload = PersistedMetadataRef {
        schema_version: METADATA_SCHEMA_VERSION,
        records,
    };
    let bytes = serde_json::to_vec(&payload)?;
    write_atomic(path, &bytes)
        .await
        .map_err(|source| StoreError::Metadata {
            path: path.display().to_string(),
            source,
        })
}

pub(crate) async fn read_metadata(path: &Path) -> Result<Vec<DocumentRecord>> {
    let bytes = tokio::fs::read(path).await?;
    let persisted: PersistedMetadata = serde_json::from_slice(&bytes)?;
    if persisted.schema_version != METADATA_SCHEMA_VERSION {
        return Err(StoreError::Inconsistent(format!(
            "unsupported metadata schema_version {} (expected {METADATA_SCHEMA_VERSION})",
            persisted.schema_version
        )));
    }
    Ok(persisted.records)
}

/// Writes the index first and the metadata second; the metadata rename is the
/// commit point.
pub(crate) async fn save_state(
    paths: &StorePaths,
    index: &dyn VectorIndex,
    records: &[DocumentRecord],
) -> Result<()> {
    write_index(&paths.index, index).await?;
    write_metadata(&paths.metadata, records).await?;
    log::debug!(
        "Persisted {} records to {}",
        records.len(),
        paths.data_dir.display()
    );
    Ok(())
}

/// Loads both artifacts or neither. Any inconsistency yields an empty state.
pub(crate) async fn load_state(
    paths: &StorePaths,
    expected_dimension: usize,
) -> (LoadedState, RecoveryOutcome) {
    let index_exists = tokio::fs::try_exists(&paths.index).await.unwrap_or(false);
    let metadata_exists = tokio::fs::try_exists(&paths.metadata)
        .await
        .unwrap_or(false);

    match (index_exists, metadata_exists) {
        (false, false) => (LoadedState::empty(), RecoveryOutcome::Fresh),
        (true, false) => reset("index present without metadata".to_string()),
        (false, true) => reset("metadata present without index".to_string()),
        (true, true) => match load_pair(paths, expected_dimension).await {
            Ok(state) => {
                let documents = state.records.len();
                (state, RecoveryOutcome::Restored { documents })
            }
            Err(err) => reset(err.to_string()),
        },
    }
}

/// Moves unusable artifacts aside after a reset. The metadata goes first so a
/// later commit can never pair a new index with records from the old corpus.
pub(crate) async fn discard_artifacts(paths: &StorePaths) -> Result<()> {
    for path in [&paths.metadata, &paths.index] {
        if !tokio::fs::try_exists(path).await? {
            continue;
        }
        let target = discarded_path_for(path);
        tokio::fs::rename(path, &target).await?;
        log::warn!("Moved {} to {}", path.display(), target.display());
    }
    Ok(())
}

/// Removes both artifacts, leaving the directory as a fresh store.
pub(crate) async fn clear_artifacts(paths: &StorePaths) -> Result<()> {
    for path in [&paths.metadata, &paths.index] {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

pub(crate) fn discarded_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(DISCARDED_SUFFIX);
    path.with_file_name(name)
}

fn reset(reason: String) -> (LoadedState, RecoveryOutcome) {
    (LoadedState::empty(), RecoveryOutcome::Reset { reason })
}

async fn load_pair(paths: &StorePaths, expected_dimension: usize) -> Result<LoadedState> {
    let index = read_index(&paths.index).await?;
    let records = read_metadata(&paths.metadata).await?;
    check_pair(index.as_ref(), &records, expected_dimension)?;
    Ok(LoadedState {
        index: Some(index),
        records,
    })
}

fn check_pair(
    index: &dyn VectorIndex,
    records: &[DocumentRecord],
    expected_dimension: usize,
) -> Result<()> {
    if index.len() != records.len() {
        return Err(StoreError::Inconsistent(format!(
            "index holds {} vectors but metadata lists {} records",
            index.len(),
            records.len()
        )));
    }
    if index.dimension() != expected_dimension {
        return Err(StoreError::Inconsistent(format!(
            "index dimension {} does not match embedder dimension {expected_dimension}",
            index.dimension()
        )));
    }

    let mut hashes = HashSet::with_capacity(records.len());
    let mut doc_ids = HashSet::with_capacity(records.len());
    for (ordinal, record) in records.iter().enumerate() {
        if record.vector_handle != ordinal {
            return Err(StoreError::Inconsistent(format!(
                "record {} has vector handle {} at position {ordinal}",
                record.doc_id, record.vector_handle
            )));
        }
        if !record.content_hash.is_well_formed() {
            return Err(StoreError::Inconsistent(format!(
                "record {} has a malformed content hash",
                record.doc_id
            )));
        }
        if !hashes.insert(&record.content_hash) {
            return Err(StoreError::Inconsistent(format!(
                "duplicate content hash {}",
                record.content_hash
            )));
        }
        if !doc_ids.insert(record.doc_id.as_str()) {
            return Err(StoreError::Inconsistent(format!(
                "duplicate doc_id {}",
                record.doc_id
            )));
        }
    }
    Ok(())
}

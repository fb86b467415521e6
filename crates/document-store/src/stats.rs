use docqa_vector_store::IndexKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Snapshot of what a store currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub documents: usize,
    /// `None` until the first document creates the index
    pub dimension: Option<usize>,
    pub index_kind: IndexKind,
    pub languages: BTreeMap<String, usize>,
    pub data_dir: PathBuf,
}

use crate::error::{Result, StoreError};
use docqa_vector_store::{
    IndexKind, StorePaths, DEFAULT_DATA_DIR_NAME, INDEX_FILE_NAME, METADATA_FILE_NAME,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_DOC_ID_PREFIX: &str = "doc_";
pub const DEFAULT_OVERFETCH_FACTOR: usize = 2;

pub const ENV_DATA_DIR: &str = "DOCQA_DATA_DIR";
pub const ENV_DOC_ID_PREFIX: &str = "DOCQA_DOC_ID_PREFIX";
pub const ENV_INDEX_KIND: &str = "DOCQA_INDEX_KIND";
pub const ENV_OVERFETCH_FACTOR: &str = "DOCQA_OVERFETCH_FACTOR";

/// Where and how a [`DocumentStore`](crate::DocumentStore) keeps its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub index_file_name: String,
    pub metadata_file_name: String,
    pub doc_id_prefix: String,
    pub index_kind: IndexKind,

    /// Candidates requested from the index per result slot
    pub overfetch_factor: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR_NAME),
            index_file_name: INDEX_FILE_NAME.to_string(),
            metadata_file_name: METADATA_FILE_NAME.to_string(),
            doc_id_prefix: DEFAULT_DOC_ID_PREFIX.to_string(),
            index_kind: IndexKind::default(),
            overfetch_factor: DEFAULT_OVERFETCH_FACTOR,
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn paths(&self) -> StorePaths {
        StorePaths::new(
            &self.data_dir,
            &self.index_file_name,
            &self.metadata_file_name,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.overfetch_factor == 0 {
            return Err(StoreError::InvalidConfig(
                "overfetch_factor must be at least 1".to_string(),
            ));
        }
        if self.index_file_name.trim().is_empty() || self.metadata_file_name.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "artifact file names must not be empty".to_string(),
            ));
        }
        if self.index_file_name == self.metadata_file_name {
            return Err(StoreError::InvalidConfig(format!(
                "index and metadata cannot share the file name '{}'",
                self.index_file_name
            )));
        }
        Ok(())
    }

    /// Overrides fields from `DOCQA_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::apply_env`] with an injectable lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = lookup(ENV_DOC_ID_PREFIX) {
            self.doc_id_prefix = prefix;
        }
        if let Some(kind) = lookup(ENV_INDEX_KIND) {
            self.index_kind = kind.parse()?;
        }
        if let Some(raw) = lookup(ENV_OVERFETCH_FACTOR) {
            self.overfetch_factor = raw.trim().parse().map_err(|_| {
                StoreError::InvalidConfig(format!("{ENV_OVERFETCH_FACTOR}: '{raw}' is not a count"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_documented_layout() {
        let config = StoreConfig::default();
        let paths = config.paths();
        assert_eq!(paths.index, PathBuf::from("data/index.bin"));
        assert_eq!(paths.metadata, PathBuf::from("data/metadata.json"));
        assert_eq!(config.doc_id_prefix, "doc_");
        assert_eq!(config.index_kind, IndexKind::FlatL2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_apply_and_validate() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DATA_DIR, "/var/lib/docqa"),
            (ENV_INDEX_KIND, "IndexFlatIP"),
            (ENV_OVERFETCH_FACTOR, "4"),
        ]);
        let mut config = StoreConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/docqa"));
        assert_eq!(config.index_kind, IndexKind::FlatIp);
        assert_eq!(config.overfetch_factor, 4);
    }

    #[test]
    fn bad_overrides_are_rejected() {
        let mut config = StoreConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_OVERFETCH_FACTOR).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig(_)));

        let err = config
            .apply_overrides(|key| (key == ENV_INDEX_KIND).then(|| "hnsw".to_string()))
            .unwrap_err();
        assert!(matches!(err, StoreError::Index(_)));

        config.overfetch_factor = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"index_kind": "flat_ip", "doc_id_prefix": "d"}"#).unwrap();
        assert_eq!(config.index_kind, IndexKind::FlatIp);
        assert_eq!(config.doc_id_prefix, "d");
        assert_eq!(config.overfetch_factor, DEFAULT_OVERFETCH_FACTOR);
    }

    #[test]
    fn file_and_env_accept_the_same_index_names() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"index_kind": "IndexFlatIP"}"#).unwrap();
        assert_eq!(config.index_kind, IndexKind::FlatIp);

        let config: StoreConfig =
            serde_json::from_str(r#"{"index_kind": "IndexFlatL2"}"#).unwrap();
        assert_eq!(config.index_kind, IndexKind::FlatL2);

        assert!(serde_json::from_str::<StoreConfig>(r#"{"index_kind": "hnsw"}"#).is_err());
        assert_eq!(
            serde_json::to_value(IndexKind::FlatIp).unwrap(),
            serde_json::json!("flat_ip")
        );
    }
}

use anyhow::{Context, Result};
use docqa_document_store::StoreConfig;
use docqa_retrieval::{IngestConfig, RetrievalConfig};
use docqa_vector_store::{EmbeddingConfig, EmbeddingMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_CONFIG: &str = "DOCQA_CONFIG";
pub const ENV_EMBEDDING_MODE: &str = "DOCQA_EMBEDDING_MODE";
pub const ENV_EMBEDDING_MODEL: &str = "DOCQA_EMBEDDING_MODEL";
pub const ENV_EMBEDDING_DIMENSION: &str = "DOCQA_EMBEDDING_DIMENSION";
pub const ENV_MODEL_DIR: &str = "DOCQA_MODEL_DIR";

/// Complete runtime configuration, one section per crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocqaConfig {
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub ingest: IngestConfig,
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_dir: Option<PathBuf>,
    pub embed_mode: Option<EmbeddingMode>,
    pub embed_model: Option<String>,
    pub model_dir: Option<PathBuf>,
}

impl DocqaConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Invalid config file")
    }

    /// Defaults, then the TOML file, then `DOCQA_*` variables, then flags.
    pub fn load(
        explicit: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
        overrides: &CliOverrides,
    ) -> Result<Self> {
        let file = explicit
            .map(Path::to_path_buf)
            .or_else(|| lookup(ENV_CONFIG).filter(|v| !v.trim().is_empty()).map(PathBuf::from));

        let mut config = match file {
            Some(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                log::debug!("Loaded config from {}", path.display());
                Self::from_toml_str(&raw)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => Self::default(),
        };

        config.store.apply_overrides(&lookup)?;
        config.apply_embedding_env(&lookup)?;
        config.retrieval.apply_overrides(&lookup)?;
        config.apply_cli(overrides);
        config.validate()?;
        Ok(config)
    }

    fn apply_embedding_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(mode) = lookup(ENV_EMBEDDING_MODE) {
            self.embedding.mode = mode.parse()?;
        }
        if let Some(model) = lookup(ENV_EMBEDDING_MODEL) {
            self.embedding.model = model;
        }
        if let Some(raw) = lookup(ENV_EMBEDDING_DIMENSION) {
            self.embedding.dimension = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_EMBEDDING_DIMENSION}: '{raw}' is not a dimension"))?;
        }
        if let Some(dir) = lookup(ENV_MODEL_DIR) {
            self.embedding.cache_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    fn apply_cli(&mut self, overrides: &CliOverrides) {
        if let Some(dir) = &overrides.data_dir {
            self.store.data_dir.clone_from(dir);
        }
        if let Some(mode) = overrides.embed_mode {
            self.embedding.mode = mode;
        }
        if let Some(model) = &overrides.embed_model {
            self.embedding.model.clone_from(model);
        }
        if let Some(dir) = &overrides.model_dir {
            self.embedding.cache_dir = Some(dir.clone());
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        self.retrieval.validate()?;
        if self.embedding.dimension == 0 {
            anyhow::bail!("embedding.dimension must be positive");
        }
        if self.ingest.allowed_extension.is_empty() {
            anyhow::bail!("ingest.allowed_extension must not be empty");
        }
        Ok(())
    }
}

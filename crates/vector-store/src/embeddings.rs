use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Multilingual sentence model used for both English and Japanese documents.
pub const DEFAULT_MODEL_ID: &str = "paraphrase-multilingual-MiniLM-L12-v2";

/// Output dimension of [`DEFAULT_MODEL_ID`].
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Maps text to a fixed-length vector.
///
/// Implementations must be safe to call concurrently; the document store
/// invokes `embed` outside of its own locks.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingMode {
    /// Local ONNX model via fastembed.
    Fast,
    /// Deterministic hash-seeded vectors, no model download.
    Stub,
}

impl EmbeddingMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Stub => "stub",
        }
    }
}

impl Default for EmbeddingMode {
    fn default() -> Self {
        if cfg!(feature = "fastembed") {
            Self::Fast
        } else {
            Self::Stub
        }
    }
}

impl FromStr for EmbeddingMode {
    type Err = VectorStoreError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "stub" => Ok(Self::Stub),
            other => Err(VectorStoreError::EmbeddingError(format!(
                "Unsupported embedding mode '{other}' (expected 'fast' or 'stub')"
            ))),
        }
    }
}

impl fmt::Display for EmbeddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the embedding backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,

    /// Model identifier (only meaningful in `fast` mode)
    pub model: String,

    /// Output dimension; the stub backend honors any positive value
    pub dimension: usize,

    /// Where fastembed caches downloaded model files
    pub cache_dir: Option<std::path::PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::default(),
            model: DEFAULT_MODEL_ID.to_string(),
            dimension: DEFAULT_EMBEDDING_DIM,
            cache_dir: None,
        }
    }
}

#[derive(Clone, Debug)]
struct StubBackend {
    dimension: usize,
}

impl StubBackend {
    const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        stub_embed(text, self.dimension)
    }
}

#[cfg(feature = "fastembed")]
mod fast {
    use super::{Result, VectorStoreError};
    use fastembed::{EmbeddingModel as FastModel, InitOptions, TextEmbedding};
    use std::path::PathBuf;
    use std::sync::Arc;

    pub(super) struct FastBackend {
        model: Arc<TextEmbedding>,
    }

    pub(super) fn model_for_id(model_id: &str) -> Result<(FastModel, usize)> {
        match model_id {
            "paraphrase-multilingual-MiniLM-L12-v2" => Ok((FastModel::ParaphraseMLMiniLML12V2, 384)),
            "all-MiniLM-L6-v2" => Ok((FastModel::AllMiniLML6V2, 384)),
            "multilingual-e5-small" => Ok((FastModel::MultilingualE5Small, 384)),
            other => Err(VectorStoreError::EmbeddingError(format!(
                "Unsupported embedding model '{other}'"
            ))),
        }
    }

    impl FastBackend {
        pub(super) fn new(model: FastModel, cache_dir: Option<PathBuf>) -> Result<Self> {
            let mut options = InitOptions::new(model).with_show_download_progress(false);
            if let Some(dir) = cache_dir {
                options = options.with_cache_dir(dir);
            }
            let model = TextEmbedding::try_new(options).map_err(|e| {
                VectorStoreError::EmbeddingError(format!("Failed to load embedding model: {e}"))
            })?;
            Ok(Self {
                model: Arc::new(model),
            })
        }

        pub(super) async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let model = self.model.clone();
            let owned = vec![text.to_string()];
            let mut embeddings = tokio::task::spawn_blocking(move || model.embed(owned, None))
                .await
                .map_err(|e| VectorStoreError::EmbeddingError(format!("Join error: {e}")))?
                .map_err(|e| VectorStoreError::EmbeddingError(e.to_string()))?;
            embeddings
                .pop()
                .ok_or_else(|| VectorStoreError::EmbeddingError("Empty embedding result".into()))
        }
    }
}

enum EmbeddingBackend {
    Stub(StubBackend),
    #[cfg(feature = "fastembed")]
    Fast(fast::FastBackend),
}

/// Embedding model selected once at startup.
pub struct EmbeddingModel {
    backend: EmbeddingBackend,
    model_id: String,
    dimension: usize,
}

impl EmbeddingModel {
    /// Loads the configured backend. Model loading happens here, not on first use.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        if config.dimension == 0 {
            return Err(VectorStoreError::EmbeddingError(
                "embedding dimension must be positive".to_string(),
            ));
        }

        match config.mode {
            EmbeddingMode::Stub => {
                log::info!(
                    "Using stub embeddings (dimension {})",
                    config.dimension
                );
                Ok(Self::stub(config.dimension))
            }
            #[cfg(feature = "fastembed")]
            EmbeddingMode::Fast => {
                let (model, dimension) = fast::model_for_id(&config.model)?;
                if dimension != config.dimension {
                    return Err(VectorStoreError::InvalidDimension {
                        expected: dimension,
                        actual: config.dimension,
                    });
                }
                log::info!("Loading embedding model {}", config.model);
                let backend = fast::FastBackend::new(model, config.cache_dir.clone())?;
                Ok(Self {
                    backend: EmbeddingBackend::Fast(backend),
                    model_id: config.model.clone(),
                    dimension,
                })
            }
            #[cfg(not(feature = "fastembed"))]
            EmbeddingMode::Fast => Err(VectorStoreError::EmbeddingError(
                "embedding mode 'fast' requires the `fastembed` feature; use 'stub' or rebuild"
                    .to_string(),
            )),
        }
    }

    #[must_use]
    pub fn stub(dimension: usize) -> Self {
        Self {
            backend: EmbeddingBackend::Stub(StubBackend::new(dimension)),
            model_id: "stub".to_string(),
            dimension,
        }
    }
}

#[async_trait]
impl Embedder for EmbeddingModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = match &self.backend {
            EmbeddingBackend::Stub(stub) => stub.embed(text),
            #[cfg(feature = "fastembed")]
            EmbeddingBackend::Fast(fast) => fast.embed(text).await?,
        };
        if vector.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vec {
        *value /= norm;
    }
}

fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let mut state =
        fnv1a_64(text.as_bytes()) ^ (dimension as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut vec = Vec::with_capacity(dimension);
    for _ in 0..dimension {
        let bits = splitmix64(&mut state);
        let high = (bits >> 32) as u32;
        let mantissa = high >> 9;
        let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
        vec.push(unit.mul_add(2.0, -1.0));
    }
    normalize(&mut vec);
    vec
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn stub_embeddings_are_deterministic_and_unit_length() {
        let model = EmbeddingModel::stub(16);
        let a = model.embed("hello").await.unwrap();
        let b = model.embed("hello").await.unwrap();
        let c = model.embed("world").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn stub_config_is_built_eagerly() {
        let config = EmbeddingConfig {
            mode: EmbeddingMode::Stub,
            dimension: 8,
            ..EmbeddingConfig::default()
        };
        let model = EmbeddingModel::from_config(&config).unwrap();
        assert_eq!(model.dimension(), 8);
        assert_eq!(model.model_id(), "stub");
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let config = EmbeddingConfig {
            mode: EmbeddingMode::Stub,
            dimension: 0,
            ..EmbeddingConfig::default()
        };
        assert!(EmbeddingModel::from_config(&config).is_err());
    }

    #[test]
    fn embedding_mode_parsing() {
        assert_eq!("STUB".parse::<EmbeddingMode>().unwrap(), EmbeddingMode::Stub);
        assert_eq!(" fast ".parse::<EmbeddingMode>().unwrap(), EmbeddingMode::Fast);
        assert!("gpu".parse::<EmbeddingMode>().is_err());
    }
}

//! # Docqa Document Store
//!
//! Content-addressed document collection on top of an embedder and an
//! append-only vector index.
//!
//! - `add` hashes the text (SHA-256), skips known content, embeds, appends to
//!   the index and the record list, then persists both before returning.
//! - `search` over-fetches from the index, drops stale handles, and ranks by
//!   `(score, doc_id)` so results are reproducible.
//! - On open, the index file and the metadata file are restored together or
//!   not at all.
//!
//! ```no_run
//! use docqa_document_store::{DocumentStore, StoreConfig};
//! use docqa_vector_store::{Embedder, EmbeddingModel};
//! use std::sync::Arc;
//!
//! # async fn run() -> docqa_document_store::Result<()> {
//! let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingModel::stub(384));
//! let store = DocumentStore::open(StoreConfig::with_data_dir("data"), embedder.clone()).await?;
//!
//! let outcome = store.add("Rust ownership rules", "en").await?;
//! let query = embedder.embed("ownership").await.map_err(docqa_document_store::StoreError::Embedding)?;
//! for hit in store.search(&query, 3).await? {
//!     println!("{} {:.3}", hit.doc_id, hit.score);
//! }
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod identity;
mod persist;
mod ranking;
mod record;
mod stats;
mod store;
mod store_lock;

pub use config::{
    StoreConfig, DEFAULT_DOC_ID_PREFIX, DEFAULT_OVERFETCH_FACTOR, ENV_DATA_DIR,
    ENV_DOC_ID_PREFIX, ENV_INDEX_KIND, ENV_OVERFETCH_FACTOR,
};
pub use error::{Result, StoreError};
pub use identity::{compute_identity, ContentHash};
pub use persist::{RecoveryOutcome, METADATA_SCHEMA_VERSION};
pub use ranking::{candidate_count, compare_hits, rank_neighbors};
pub use record::{AddOutcome, DocumentRecord, SearchHit};
pub use stats::StoreStats;
pub use store::DocumentStore;

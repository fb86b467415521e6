//! # Docqa Vector Store
//!
//! Capabilities the document store is built on: text embedding and an
//! append-only vector index with a binary on-disk form.
//!
//! ## Architecture
//!
//! ```text
//! text
//!   │
//!   ├──> Embedder (fastembed | stub)
//!   │      └─> Vec<f32>[dimension]
//!   │
//!   ├──> VectorIndex (flat_l2 | flat_ip)
//!   │      └─> insertion-order handles, (handle, distance) neighbors
//!   │
//!   └──> index_io
//!          └─> atomic tmp + fsync + rename writes
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use docqa_vector_store::{Embedder, EmbeddingModel, IndexKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), docqa_vector_store::VectorStoreError> {
//!     let embedder = EmbeddingModel::stub(384);
//!     let mut index = IndexKind::FlatL2.build(embedder.dimension());
//!
//!     let handle = index.add(&embedder.embed("hello world").await?)?;
//!     let neighbors = index.search(&embedder.embed("hello").await?, 5)?;
//!
//!     println!("inserted {handle}, nearest: {:?}", neighbors.first());
//!     Ok(())
//! }
//! ```

mod embeddings;
mod error;
mod index;
mod index_io;
mod paths;

pub use embeddings::{
    Embedder, EmbeddingConfig, EmbeddingMode, EmbeddingModel, DEFAULT_EMBEDDING_DIM,
    DEFAULT_MODEL_ID,
};
pub use error::{Result, VectorStoreError};
pub use index::{decode_index, FlatIndex, IndexKind, Neighbor, VectorIndex};
pub use index_io::{read_index, write_atomic, write_index};
pub use paths::{
    tmp_path_for, StorePaths, DEFAULT_DATA_DIR_NAME, INDEX_FILE_NAME, LOCK_FILE_NAME,
    METADATA_FILE_NAME,
};

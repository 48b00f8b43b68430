//! Embedding support for the search engine
//!
//! Split into submodules:
//! - `model`: query embedding (fastembed, ONNX-based)
//! - `store`: precomputed catalog vectors and nearest-neighbour lookup

mod model;
mod store;

pub use model::{FastEmbedder, QueryEmbedder};
pub use store::{ScoredRow, VectorIndex};

/// Default embedding model (all-MiniLM-L6-v2 - 384 dimensions, good balance
/// of speed/quality; the bundle precomputation uses the same checkpoint)
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Embedding dimension for the default model
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

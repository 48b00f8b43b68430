mod embedding;
mod generator;
mod llm;

pub use embedding::{
    FastEmbedder, QueryEmbedder, ScoredRow, VectorIndex, DEFAULT_EMBEDDING_DIM,
    DEFAULT_EMBEDDING_MODEL,
};
pub use generator::ResponseGenerator;
pub use llm::{OllamaClient, TextCompletion};

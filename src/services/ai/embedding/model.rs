//! Query embedding into the catalog bundle's vector space.

use async_trait::async_trait;
use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use tokio::sync::Mutex;

/// Seam between the search engine and the embedding backend. Tests plug in a
/// deterministic embedder; production uses [`FastEmbedder`].
#[async_trait]
pub trait QueryEmbedder: Send + Sync {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, String>;

    fn dimension(&self) -> usize;
}

/// fastembed-backed query embedder. The model is not thread safe for
/// concurrent inference, so calls are serialized through a mutex.
pub struct FastEmbedder {
    model: Mutex<TextEmbedding>,
    dimension: usize,
}

impl FastEmbedder {
    pub fn new(model_name: &str, dimension: usize) -> Result<Self, String> {
        let model: EmbeddingModel = model_name
            .parse::<EmbeddingModel>()
            .map_err(|e| e.to_string())?;
        let model = TextEmbedding::try_new(TextInitOptions::new(model))
            .map_err(|e| e.to_string())?;

        Ok(Self {
            model: Mutex::new(model),
            dimension,
        })
    }
}

#[async_trait]
impl QueryEmbedder for FastEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, String> {
        let vectors = {
            let mut model = self.model.lock().await;
            model.embed(vec![text], None)
        }
        .map_err(|e| e.to_string())?;

        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| "query embedding returned no vectors".to_string())?;

        if vector.len() != self.dimension {
            return Err(format!(
                "embedding dimension {} does not match expected {}",
                vector.len(),
                self.dimension
            ));
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::agent::{ChatAgent, IntentClassifier, SessionStore};
use crate::catalog::Catalog;
use crate::services::ai::{
    FastEmbedder, OllamaClient, ResponseGenerator, TextCompletion, VectorIndex,
};
use crate::services::nlp::QueryNormalizer;
use crate::services::search::{HybridSearchEngine, SearchHandle};
use crate::services::EngineConfig;

/// Shared application state. Cheap to clone; everything inside is shared.
#[derive(Clone)]
pub struct AppState {
    pub search: SearchHandle,
    pub agent: Arc<ChatAgent>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Wire up the conversation stack from config. The search engine starts
    /// pending; run [`AppState::load_search`] (usually in a spawned task) to
    /// bring it up.
    pub fn new(config: &EngineConfig) -> Self {
        let completion: Option<Arc<dyn TextCompletion>> = if config.generator.enabled {
            Some(Arc::new(OllamaClient::new(
                config.generator.base_url.clone(),
                config.generator.model.clone(),
            )))
        } else {
            None
        };

        let search = SearchHandle::new_pending();
        let sessions = Arc::new(SessionStore::new(Duration::from_secs(
            config.session_idle_ttl_secs,
        )));
        let agent = Arc::new(ChatAgent::new(
            search.clone(),
            IntentClassifier::new(completion.clone()),
            ResponseGenerator::new(completion),
            sessions.clone(),
        ));

        Self {
            search,
            agent,
            sessions,
        }
    }

    /// State around an existing search handle, with the generative fallback
    /// disabled. Used by tests and callers that manage the engine themselves.
    pub fn with_search(search: SearchHandle) -> Self {
        let sessions = Arc::new(SessionStore::new(Duration::ZERO));
        let agent = Arc::new(ChatAgent::new(
            search.clone(),
            IntentClassifier::new(None),
            ResponseGenerator::new(None),
            sessions.clone(),
        ));
        Self {
            search,
            agent,
            sessions,
        }
    }

    /// Load the startup artifacts (catalog CSV, embedding bundle, spelling
    /// dictionary) and the embedding model, then flip the handle to ready.
    /// Failures park the handle in the error state; requests keep getting a
    /// structured error instead of a crash.
    pub async fn load_search(&self, config: EngineConfig) {
        match build_engine(&config).await {
            Ok(engine) => {
                tracing::info!("search engine ready");
                self.search.set_ready(Arc::new(engine));
            }
            Err(err) => {
                tracing::error!(error = %err, "search engine failed to load");
                self.search.set_error(err);
            }
        }
    }
}

async fn build_engine(config: &EngineConfig) -> Result<HybridSearchEngine, String> {
    let catalog = Catalog::load(Path::new(&config.catalog_path)).map_err(|e| e.to_string())?;
    let index = VectorIndex::load(Path::new(&config.vector.bundle_path))?;
    let normalizer = QueryNormalizer::load(Path::new(&config.dictionary_path))?;
    let embedder = FastEmbedder::new(
        &config.vector.embedding_model,
        config.vector.embedding_dimension,
    )?;

    HybridSearchEngine::new(catalog, index, Arc::new(embedder), normalizer)
}

//! Engine configuration.
//!
//! A plain JSON file with serde defaults; a missing or unreadable file means
//! the defaults. No secrets live here - the generator endpoint is a local
//! model server.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ai::{DEFAULT_EMBEDDING_DIM, DEFAULT_EMBEDDING_MODEL};

/// Generative fallback endpoint (Ollama-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub model: String,
    pub enabled: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "phi3".to_string(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub bundle_path: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            bundle_path: "data/embeddings.json".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimension: DEFAULT_EMBEDDING_DIM,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub catalog_path: String,
    pub dictionary_path: String,
    pub vector: VectorConfig,
    pub generator: GeneratorConfig,
    /// Sessions idle longer than this are evicted; 0 disables eviction.
    pub session_idle_ttl_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog_path: "data/catalog.csv".to_string(),
            dictionary_path: "data/frequency_dictionary.txt".to_string(),
            vector: VectorConfig::default(),
            generator: GeneratorConfig::default(),
            session_idle_ttl_secs: 3600,
        }
    }
}

impl EngineConfig {
    /// Load the config file, falling back to defaults when it is missing or
    /// malformed. Config problems should never stop the engine from booting.
    pub fn load_or_default(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(error = %err, path = %path.display(), "invalid config file, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        let contents =
            serde_json::to_string_pretty(self).map_err(|e| format!("serialize config: {e}"))?;
        fs::write(path, contents).map_err(|e| format!("write config: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::load_or_default(&dir.path().join("absent.json"));
        assert_eq!(config.catalog_path, "data/catalog.csv");
        assert_eq!(config.vector.embedding_dimension, DEFAULT_EMBEDDING_DIM);
        assert_eq!(config.session_idle_ttl_secs, 3600);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "catalog_path": "elsewhere.csv" }"#).unwrap();

        let config = EngineConfig::load_or_default(&path);
        assert_eq!(config.catalog_path, "elsewhere.csv");
        assert_eq!(config.vector.embedding_model, DEFAULT_EMBEDDING_MODEL);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = EngineConfig::default();
        config.generator.enabled = false;
        config.session_idle_ttl_secs = 0;
        config.save(&path).unwrap();

        let reloaded = EngineConfig::load_or_default(&path);
        assert!(!reloaded.generator.enabled);
        assert_eq!(reloaded.session_idle_ttl_secs, 0);
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let config = EngineConfig::load_or_default(&path);
        assert_eq!(config.catalog_path, "data/catalog.csv");
    }
}

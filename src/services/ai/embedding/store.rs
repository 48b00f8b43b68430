//! Precomputed embedding bundle and in-memory nearest-neighbour lookup.
//!
//! The bundle is produced offline by the dataset precomputation job and is
//! read-only at serve time. Vectors are L2-normalized at load so that
//! similarity is a plain dot product (higher = closer).

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One catalog row scored against a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRow {
    pub row_id: usize,
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct BundleFile {
    model: String,
    dimension: usize,
    entries: Vec<BundleEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BundleEntry {
    row_id: usize,
    vector: Vec<f32>,
}

/// In-memory vector index over the catalog rows.
pub struct VectorIndex {
    model: String,
    dimension: usize,
    ids: Vec<usize>,
    vectors: Vec<Vec<f32>>,
}

impl VectorIndex {
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read embedding bundle {}: {}", path.display(), e))?;
        let bundle: BundleFile = serde_json::from_str(&contents)
            .map_err(|e| format!("invalid embedding bundle: {e}"))?;
        let entries = bundle
            .entries
            .into_iter()
            .map(|entry| (entry.row_id, entry.vector))
            .collect();
        Self::from_entries(bundle.model, bundle.dimension, entries)
    }

    pub fn from_entries(
        model: String,
        dimension: usize,
        entries: Vec<(usize, Vec<f32>)>,
    ) -> Result<Self, String> {
        if dimension == 0 {
            return Err("embedding bundle dimension is zero".to_string());
        }
        if entries.is_empty() {
            return Err("embedding bundle has no entries".to_string());
        }

        let mut ids = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len());
        for (row_id, vector) in entries {
            if vector.len() != dimension {
                return Err(format!(
                    "row {} vector has dimension {}, bundle declares {}",
                    row_id,
                    vector.len(),
                    dimension
                ));
            }
            ids.push(row_id);
            vectors.push(normalize(vector));
        }

        tracing::info!(rows = ids.len(), dimension, model = %model, "embedding index loaded");

        Ok(Self {
            model,
            dimension,
            ids,
            vectors,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// The `k` nearest rows to `query` by cosine similarity, best first.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<ScoredRow>, String> {
        if query.len() != self.dimension {
            return Err(format!(
                "query vector has dimension {}, index expects {}",
                query.len(),
                self.dimension
            ));
        }

        let query = normalize(query.to_vec());
        let mut scored: Vec<ScoredRow> = self
            .ids
            .iter()
            .zip(&self.vectors)
            .map(|(&row_id, vector)| ScoredRow {
                row_id,
                score: dot(&query, vector),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in &mut vector {
            *value /= norm;
        }
    }
    vector
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::tempdir;

    use super::*;

    fn index() -> VectorIndex {
        VectorIndex::from_entries(
            "test-model".to_string(),
            3,
            vec![
                (0, vec![1.0, 0.0, 0.0]),
                (1, vec![0.0, 2.0, 0.0]),
                (2, vec![0.7, 0.7, 0.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_nearest_orders_by_similarity() {
        let index = index();
        let results = index.nearest(&[1.0, 0.0, 0.0], 3).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].row_id, 0);
        assert_eq!(results[1].row_id, 2);
        assert!(results[0].score > results[1].score);
        assert!(results[1].score > results[2].score);
    }

    #[test]
    fn test_nearest_truncates_to_k() {
        let index = index();
        let results = index.nearest(&[0.0, 1.0, 0.0], 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].row_id, 1);
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let index = index();
        assert!(index.nearest(&[1.0, 0.0], 3).is_err());
        assert!(VectorIndex::from_entries("m".to_string(), 3, vec![(0, vec![1.0])]).is_err());
    }

    #[test]
    fn test_load_bundle_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bundle.json");
        let bundle = BundleFile {
            model: "test-model".to_string(),
            dimension: 2,
            entries: vec![
                BundleEntry {
                    row_id: 0,
                    vector: vec![1.0, 0.0],
                },
                BundleEntry {
                    row_id: 1,
                    vector: vec![0.0, 1.0],
                },
            ],
        };
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(serde_json::to_string(&bundle).unwrap().as_bytes())
            .unwrap();

        let index = VectorIndex::load(&path).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.model(), "test-model");
        let best = index.nearest(&[0.0, 3.0], 1).unwrap();
        assert_eq!(best[0].row_id, 1);
    }
}

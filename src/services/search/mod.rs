//! Two-stage hybrid search over the repair-service catalog.
//!
//! Stage 1 casts a wide semantic net: the normalized query is embedded and
//! the nearest catalog vectors are fetched as candidates. Stage 2 re-ranks
//! the candidates by keyword tier, caps the list, then applies an optional
//! price filter. Upstream failures degrade to an empty result list; they are
//! logged and never surfaced to the caller.

mod ranking;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogRecord};
use crate::services::ai::{QueryEmbedder, VectorIndex};
use crate::services::nlp::QueryNormalizer;

pub use ranking::MatchBucket;
use ranking::{classify, filter_by_price, sort_bucket, LoweredFields, BUCKET_ORDER};

/// Candidates fetched from the vector index before re-ranking. Deliberately
/// over-fetched so keyword matches deep in the pool still surface.
const CANDIDATE_POOL: usize = 100;

/// Global result cap per response.
pub const MAX_RESULTS: usize = 10;

/// Price filter half-width, in currency units.
const PRICE_TOLERANCE: f64 = 50.0;

/// A catalog row projected into one search response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceItem {
    pub id: String,
    pub service: String,
    pub description: String,
    pub price: f64,
    pub garment_type: String,
    pub repairer_type: String,
    pub category: String,
    pub estimated_hours: Option<f64>,
    pub similarity_score: f32,
    pub match_type: MatchBucket,
    pub match_detail: String,
    pub search_terms: Vec<String>,
}

struct RankedRow<'a> {
    record: &'a CatalogRecord,
    score: f32,
    bucket: MatchBucket,
    matched_term: Option<String>,
}

pub struct HybridSearchEngine {
    catalog: Catalog,
    index: VectorIndex,
    embedder: Arc<dyn QueryEmbedder>,
    normalizer: QueryNormalizer,
}

impl HybridSearchEngine {
    pub fn new(
        catalog: Catalog,
        index: VectorIndex,
        embedder: Arc<dyn QueryEmbedder>,
        normalizer: QueryNormalizer,
    ) -> Result<Self, String> {
        if index.dimension() != embedder.dimension() {
            return Err(format!(
                "index dimension {} does not match embedder dimension {}",
                index.dimension(),
                embedder.dimension()
            ));
        }
        if index.len() != catalog.len() {
            tracing::warn!(
                index_rows = index.len(),
                catalog_rows = catalog.len(),
                "embedding index and catalog row counts differ"
            );
        }

        Ok(Self {
            catalog,
            index,
            embedder,
            normalizer,
        })
    }

    /// Run the full two-stage search. `limit` is clamped to [`MAX_RESULTS`].
    pub async fn search(&self, query: &str, limit: usize) -> Vec<ServiceItem> {
        let cap = limit.clamp(1, MAX_RESULTS);

        let corrected = self.normalizer.correct(query);
        let normalized = self.normalizer.lemmatizer().lemmatize(&corrected);
        let target_price = extract_target_price(&corrected);
        let search_terms: Vec<String> = corrected
            .split_whitespace()
            .filter(|term| term.len() > 2)
            .map(str::to_string)
            .collect();

        tracing::debug!(
            query,
            %corrected,
            %normalized,
            ?target_price,
            "running hybrid search"
        );

        let query_vector = match self.embedder.embed_query(&normalized).await {
            Ok(vector) => vector,
            Err(err) => {
                tracing::warn!(error = %err, "query embedding failed");
                return Vec::new();
            }
        };

        let candidates = match self.index.nearest(&query_vector, CANDIDATE_POOL) {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(error = %err, "candidate retrieval failed");
                return Vec::new();
            }
        };

        // Stage 2: file every candidate into exactly one keyword tier.
        let mut buckets: [Vec<RankedRow>; BUCKET_ORDER.len()] =
            std::array::from_fn(|_| Vec::new());
        for scored in candidates {
            let Some(record) = self.catalog.get(scored.row_id) else {
                tracing::warn!(row_id = scored.row_id, "index row missing from catalog");
                continue;
            };
            let fields = LoweredFields {
                service: record.service.to_lowercase(),
                description: record.description.to_lowercase(),
                garment: record.garment_type.to_lowercase(),
                repairer: record.repairer_type.to_lowercase(),
            };
            let (bucket, matched_term) = classify(&fields, &search_terms);
            buckets[bucket as usize].push(RankedRow {
                record,
                score: scored.score,
                bucket,
                matched_term,
            });
        }

        // Concatenate tiers in priority order, best-scored first within each,
        // until the cap is reached.
        let mut assembled: Vec<RankedRow> = Vec::with_capacity(cap);
        for bucket in &mut buckets {
            if assembled.len() >= cap {
                break;
            }
            sort_bucket(bucket, |row| row.score);
            let remaining = cap - assembled.len();
            assembled.extend(bucket.drain(..).take(remaining));
        }

        // The price filter runs after truncation and never backfills.
        let assembled = match target_price {
            Some(target) => {
                filter_by_price(assembled, target, PRICE_TOLERANCE, |row| row.record.price)
            }
            None => assembled,
        };

        assembled
            .into_iter()
            .enumerate()
            .map(|(rank, row)| to_service_item(rank, row, &search_terms))
            .collect()
    }
}

fn to_service_item(rank: usize, row: RankedRow, search_terms: &[String]) -> ServiceItem {
    let match_detail = match &row.matched_term {
        Some(term) => format!("{}:{}", row.bucket.as_str(), term),
        None => "semantic_only".to_string(),
    };

    ServiceItem {
        id: format!("service_{}", rank + 1),
        service: row.record.service.clone(),
        description: row.record.description.clone(),
        price: row.record.price,
        garment_type: row.record.garment_type.clone(),
        repairer_type: row.record.repairer_type.clone(),
        category: row.record.category.clone(),
        estimated_hours: row.record.estimated_hours,
        similarity_score: row.score,
        match_type: row.bucket,
        match_detail,
        search_terms: search_terms.to_vec(),
    }
}

#[derive(Clone)]
enum SearchStatus {
    Pending,
    Ready(Arc<HybridSearchEngine>),
    Error(String),
}

/// Shared handle to the search engine while it boots in the background.
/// Callers either poll [`SearchHandle::current`] (structured `NotReady`
/// error until the engine is up) or block on [`SearchHandle::wait_ready`].
#[derive(Clone)]
pub struct SearchHandle {
    sender: tokio::sync::watch::Sender<SearchStatus>,
}

impl SearchHandle {
    pub fn new_pending() -> Self {
        let (sender, _receiver) = tokio::sync::watch::channel(SearchStatus::Pending);
        Self { sender }
    }

    pub fn set_ready(&self, engine: Arc<HybridSearchEngine>) {
        // send_replace: the status must stick even with no receiver around
        self.sender.send_replace(SearchStatus::Ready(engine));
    }

    pub fn set_error(&self, error: String) {
        self.sender.send_replace(SearchStatus::Error(error));
    }

    pub fn current(&self) -> crate::error::AppResult<Arc<HybridSearchEngine>> {
        let status = self.sender.borrow().clone();
        match status {
            SearchStatus::Ready(engine) => Ok(engine),
            SearchStatus::Pending => Err(crate::error::AppError::NotReady),
            SearchStatus::Error(err) => Err(crate::error::AppError::Catalog(err)),
        }
    }

    pub async fn wait_ready(&self) -> crate::error::AppResult<Arc<HybridSearchEngine>> {
        let mut receiver = self.sender.subscribe();
        loop {
            let status = receiver.borrow().clone();
            match status {
                SearchStatus::Ready(engine) => return Ok(engine),
                SearchStatus::Error(err) => return Err(crate::error::AppError::Catalog(err)),
                SearchStatus::Pending => receiver.changed().await.map_err(|_| {
                    crate::error::AppError::Catalog("search init channel closed".to_string())
                })?,
            }
        }
    }
}

/// First 2-5 digit integer token of the corrected query, if any.
fn extract_target_price(text: &str) -> Option<f64> {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .find(|token| {
            (2..=5).contains(&token.len()) && token.chars().all(|c| c.is_ascii_digit())
        })
        .and_then(|token| token.parse::<f64>().ok())
}

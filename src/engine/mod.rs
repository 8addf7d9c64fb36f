//! Search engine port
//!
//! [`SearchEngine`] is the boundary between query/result logic and the wire
//! protocol of a concrete engine. Adapters only translate the compiled
//! [`SearchRequest`] and the engine's responses; query construction lives in
//! [`crate::search::QueryCompiler`].
//!
//! Exactly one adapter is selected at startup (see [`create_engine`]).

pub mod factory;
pub mod memory;
pub mod opensearch;

pub use factory::{create_engine, create_in_memory_engine};
pub use memory::InMemoryEngine;
pub use opensearch::OpenSearchEngine;

use crate::models::Product;
use crate::search::{SearchError, SearchRequest, SearchResult};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Raw hit metadata as reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineHit {
    /// Engine document id
    pub id: String,
    /// Relevance score; absent when the engine did not compute one
    pub score: Option<f64>,
}

/// One aggregation bucket as reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineBucket {
    pub key: String,
    pub doc_count: u64,
    pub from: Option<f64>,
    pub to: Option<f64>,
}

/// Raw engine response.
///
/// `hits` and `documents` are separate collections; consumers correlate them
/// by id rather than by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSearchResponse {
    pub total: u64,
    pub hits: Vec<EngineHit>,
    pub documents: Vec<Product>,
    /// Buckets keyed by aggregation name
    pub aggregations: HashMap<String, Vec<EngineBucket>>,
}

/// Failure of one item in a bulk write
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemError {
    /// Position in the submitted batch
    pub index: usize,
    pub id: Option<u64>,
    pub reason: String,
}

/// Item-by-item outcome of a bulk write. Bulk writes are not atomic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkIndexReport {
    /// True only when every item was indexed
    pub success: bool,
    /// Number of confirmed-indexed items
    pub indexed: usize,
    /// Positions of the confirmed-indexed items
    pub succeeded: Vec<usize>,
    pub errors: Vec<BulkItemError>,
}

impl BulkIndexReport {
    /// Build a report for a batch of `total` items given the failed ones
    pub fn from_errors(total: usize, errors: Vec<BulkItemError>) -> Self {
        let succeeded: Vec<usize> = (0..total)
            .filter(|i| !errors.iter().any(|e| e.index == *i))
            .collect();
        Self {
            success: errors.is_empty(),
            indexed: succeeded.len(),
            succeeded,
            errors,
        }
    }
}

/// Abstraction over a document store with search and aggregation support
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Adapter name for logging
    fn name(&self) -> &'static str;

    /// Create the product collection with its mappings when it does not exist
    async fn ensure_index(&self) -> SearchResult<()>;

    /// Allocate the next product identifier
    async fn next_id(&self) -> SearchResult<u64>;

    /// Index (create or replace) a single product, returning its id
    async fn index_document(&self, product: &Product) -> SearchResult<u64>;

    /// Index many products. Item failures are reported in the returned report;
    /// `Err` means the call as a whole failed and nothing can be assumed written.
    async fn bulk_index(&self, products: &[Product]) -> SearchResult<BulkIndexReport>;

    /// Fetch a product regardless of its active flag
    async fn get_document(&self, id: u64) -> SearchResult<Option<Product>>;

    /// Overwrite the top-level fields present in `partial`; nested objects such
    /// as `attributes` are replaced, not merged. Returns false when the product
    /// does not exist.
    async fn update_document(&self, id: u64, partial: &Value) -> SearchResult<bool>;

    /// Physically remove a product. Returns false when it does not exist.
    async fn delete_document(&self, id: u64) -> SearchResult<bool>;

    /// Execute a compiled request
    async fn search(&self, request: &SearchRequest) -> SearchResult<EngineSearchResponse>;

    /// Execute a compiled request that carries aggregations
    async fn search_with_facets(&self, request: &SearchRequest) -> SearchResult<EngineSearchResponse> {
        if request.aggregations.is_empty() {
            return Err(SearchError::InvalidQuery(
                "faceted search requires at least one aggregation".to_string(),
            ));
        }
        self.search(request).await
    }

    /// Whether the engine is reachable and serving
    async fn health_check(&self) -> bool;
}

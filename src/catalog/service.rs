use crate::engine::{BulkIndexReport, BulkItemError, SearchEngine};
use crate::error::{AppError, Result};
use crate::models::{fields, CreateProductRequest, Product, UpdateProductRequest};
use crate::search::{
    extract_suggestions, shape_faceted, shape_search, FacetedSearchQuery, FacetedSearchResults,
    QueryCompiler, SearchConfig, SearchQuery, SearchResults, Suggestion,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

/// Product catalog operations backed by a search engine
#[derive(Clone)]
pub struct CatalogService {
    engine: Arc<dyn SearchEngine>,
    compiler: Arc<QueryCompiler>,
}

impl CatalogService {
    /// Create a new catalog service
    pub fn new(engine: Arc<dyn SearchEngine>, config: SearchConfig) -> Self {
        Self {
            engine,
            compiler: Arc::new(QueryCompiler::new(config)),
        }
    }

    pub fn engine(&self) -> &Arc<dyn SearchEngine> {
        &self.engine
    }

    pub fn config(&self) -> &SearchConfig {
        self.compiler.config()
    }

    /// Create a product with a freshly allocated id
    pub async fn create(&self, request: CreateProductRequest) -> Result<Product> {
        request.validate()?;

        let id = self.engine.next_id().await?;
        let product = request.into_product(id, Utc::now());
        self.engine.index_document(&product).await?;

        tracing::info!(product_id = id, title = %product.title, "Product created");
        Ok(product)
    }

    /// Create many products. Items are validated and indexed independently;
    /// positions in the report refer to `requests`.
    pub async fn bulk_create(&self, requests: Vec<CreateProductRequest>) -> Result<BulkIndexReport> {
        let total = requests.len();
        let mut errors = Vec::new();
        let mut products = Vec::with_capacity(total);
        let mut positions = Vec::with_capacity(total);

        let now = Utc::now();
        for (index, request) in requests.into_iter().enumerate() {
            if let Err(e) = request.validate() {
                errors.push(BulkItemError {
                    index,
                    id: None,
                    reason: e.to_string(),
                });
                continue;
            }
            let id = self.engine.next_id().await?;
            products.push(request.into_product(id, now));
            positions.push(index);
        }

        if !products.is_empty() {
            let report = self.engine.bulk_index(&products).await?;
            errors.extend(report.errors.into_iter().map(|error| BulkItemError {
                index: positions.get(error.index).copied().unwrap_or(error.index),
                ..error
            }));
        }
        errors.sort_by_key(|e| e.index);

        let report = BulkIndexReport::from_errors(total, errors);
        tracing::info!(
            total = total,
            indexed = report.indexed,
            failed = report.errors.len(),
            "Bulk create finished"
        );
        Ok(report)
    }

    /// Fetch an active product
    pub async fn get(&self, id: u64) -> Result<Product> {
        match self.engine.get_document(id).await? {
            Some(product) if product.is_active => Ok(product),
            _ => Err(not_found(id)),
        }
    }

    /// Apply a partial update. Only supplied fields change.
    pub async fn update(&self, id: u64, request: UpdateProductRequest) -> Result<Product> {
        request.validate()?;

        let mut product = self.get(id).await?;
        if !request.has_updates() {
            return Ok(product);
        }

        if !self
            .engine
            .update_document(id, &request.to_partial_document())
            .await?
        {
            return Err(not_found(id));
        }

        request.apply(&mut product);
        tracing::info!(product_id = id, "Product updated");
        Ok(product)
    }

    /// Soft delete: the document stays in the engine with `isActive = false`
    pub async fn delete(&self, id: u64) -> Result<()> {
        self.get(id).await?;

        if !self
            .engine
            .update_document(id, &json!({ fields::IS_ACTIVE: false }))
            .await?
        {
            return Err(not_found(id));
        }

        tracing::info!(product_id = id, "Product deactivated");
        Ok(())
    }

    /// Page through active products
    pub async fn list(&self, page: usize, page_size: usize) -> Result<SearchResults> {
        self.search(&SearchQuery::default().with_page(page, page_size))
            .await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResults> {
        query.validate(self.config().max_page_size, self.config().max_result_window)?;

        let request = self.compiler.compile(query);
        tracing::debug!(
            text = ?query.text_query(),
            page = query.page,
            page_size = query.page_size,
            "Executing product search"
        );

        let response = self.engine.search(&request).await?;
        let results = shape_search(
            response,
            query.page,
            query.page_size,
            query.text_query().is_some(),
        );

        tracing::debug!(total = results.total, returned = results.products.len(), "Search completed");
        Ok(results)
    }

    pub async fn faceted_search(&self, query: &FacetedSearchQuery) -> Result<FacetedSearchResults> {
        query.validate(self.config().max_page_size, self.config().max_result_window)?;

        let request = self.compiler.compile_faceted(query);
        let response = self.engine.search_with_facets(&request).await?;
        Ok(shape_faceted(response, query))
    }

    /// Autocomplete suggestions for `prefix`.
    ///
    /// `limit` defaults to the configured suggestion count and is clamped to
    /// the configured maximum. A blank prefix yields no suggestions.
    pub async fn suggest(&self, prefix: &str, limit: Option<usize>) -> Result<Vec<Suggestion>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        let config = self.config();
        let limit = limit
            .unwrap_or(config.default_suggestions)
            .clamp(1, config.max_suggestions);

        let request = self.compiler.compile_suggest(prefix, limit);
        let response = self.engine.search(&request).await?;
        Ok(extract_suggestions(prefix, &response.documents, limit))
    }

    /// Whether the engine is reachable
    pub async fn health(&self) -> bool {
        self.engine.health_check().await
    }
}

fn not_found(id: u64) -> AppError {
    AppError::NotFound(format!("Product {} not found", id))
}

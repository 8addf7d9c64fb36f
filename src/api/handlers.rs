use crate::api::AppState;
use crate::engine::BulkIndexReport;
use crate::error::{AppError, Result};
use crate::models::*;
use crate::search::{
    FacetDimension, FacetedSearchQuery, FacetedSearchResults, SearchFilters, SearchQuery,
    SearchResults, SortMode, Suggestion,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let engine_healthy = state.catalog.health().await;
    let status = if engine_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if engine_healthy { "healthy" } else { "unhealthy" }.to_string(),
            engine: state.catalog.engine().name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub engine: String,
    pub version: String,
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.catalog.create(request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Create many products; the report lists per-item failures
pub async fn bulk_create_products(
    State(state): State<AppState>,
    Json(request): Json<BulkCreateRequest>,
) -> Result<Json<BulkIndexReport>> {
    request.validate()?;
    Ok(Json(state.catalog.bulk_create(request.products).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkCreateRequest {
    #[validate(length(min = 1, max = 1000))]
    pub products: Vec<CreateProductRequest>,
}

/// Get a product by id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog.get(id).await?))
}

/// Partially update a product
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog.update(id, request).await?))
}

/// Soft-delete a product
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode> {
    state.catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List active products
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SearchResults>> {
    let (page, page_size) = pagination(&params, state.catalog.config().default_page_size)?;
    Ok(Json(state.catalog.list(page, page_size).await?))
}

/// Full-text search with filters, sort and pagination
pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<SearchResults>> {
    let query = search_query(&params, state.catalog.config().default_page_size)?;
    Ok(Json(state.catalog.search(&query).await?))
}

/// Search with category, brand and price-range facets
pub async fn faceted_search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<FacetedSearchResults>> {
    let mut query = FacetedSearchQuery::new(search_query(
        &params,
        state.catalog.config().default_page_size,
    )?);

    if let Some(facets) = params.get("facets") {
        for name in facets.split(',').filter(|n| !n.trim().is_empty()) {
            let dimension = FacetDimension::parse(name)
                .ok_or_else(|| AppError::Validation(format!("Unknown facet '{}'", name.trim())))?;
            query = query.with_facet(dimension);
        }
    }
    for (name, dimension) in [
        ("categorySize", FacetDimension::Category),
        ("brandSize", FacetDimension::Brand),
    ] {
        if let Some(size) = parse_number(&params, name)? {
            query = query.with_facet_size(dimension, size);
        }
    }

    Ok(Json(state.catalog.faceted_search(&query).await?))
}

/// Autocomplete suggestions
pub async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Suggestion>>> {
    let prefix = params.get("q").map(String::as_str).unwrap_or_default();
    let limit = parse_number(&params, "limit")?;
    Ok(Json(state.catalog.suggest(prefix, limit).await?))
}

fn search_query(params: &HashMap<String, String>, default_page_size: usize) -> Result<SearchQuery> {
    let filters = SearchFilters::from_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    let (page, page_size) = pagination(params, default_page_size)?;

    Ok(SearchQuery {
        text: params.get("q").cloned(),
        filters,
        sort: params
            .get("sort")
            .map(|s| SortMode::parse(s))
            .unwrap_or_default(),
        page,
        page_size,
    })
}

fn pagination(params: &HashMap<String, String>, default_page_size: usize) -> Result<(usize, usize)> {
    let page = parse_number(params, "page")?.unwrap_or(1);
    let page_size = match parse_number(params, "pageSize")? {
        Some(size) => size,
        None => parse_number(params, "page_size")?.unwrap_or(default_page_size),
    };
    Ok((page, page_size))
}

fn parse_number(params: &HashMap<String, String>, name: &str) -> Result<Option<usize>> {
    match params.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{} must be a positive integer", name))),
        None => Ok(None),
    }
}

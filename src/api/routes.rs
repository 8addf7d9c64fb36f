use crate::api::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        // Catalog management
        .route(
            "/v1/products",
            post(handlers::create_product).get(handlers::list_products),
        )
        .route("/v1/products/bulk", post(handlers::bulk_create_products))
        .route(
            "/v1/products/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        // Search
        .route("/v1/search", get(handlers::search_products))
        .route("/v1/search/facets", get(handlers::faceted_search))
        .route("/v1/search/suggestions", get(handlers::suggestions))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
}

use catalog_search::{
    api::{build_router, AppState},
    catalog::CatalogService,
    config::Config,
    engine::create_engine,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration (in-memory engine)");
        Config::default()
    });

    // Initialize tracing
    let json_logs = config.observability.json_logs;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "catalog_search={},tower_http=info",
                    config.observability.log_level
                )
                .into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(
        service = %config.observability.service_name,
        "Starting catalog search v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Initialize search engine backend
    tracing::info!("Engine backend: {:?}", config.engine.backend);
    let engine = create_engine(&config.engine).await?;
    if engine.health_check().await {
        tracing::info!("✅ Search engine reachable ({})", engine.name());
    } else {
        tracing::warn!("⚠️  Search engine not reachable yet ({}); requests will fail until it is", engine.name());
    }

    let catalog = Arc::new(CatalogService::new(engine, config.search.clone()));
    tracing::info!("✅ Catalog service initialized");

    // Build HTTP router with REST API
    let app = build_router(AppState::new(catalog)).layer(TimeoutLayer::new(Duration::from_secs(
        config.server.request_timeout_secs,
    )));

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Products: http://{}/v1/products", http_addr);
    tracing::info!("   Search: http://{}/v1/search", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, app).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutting down gracefully...");
    Ok(())
}

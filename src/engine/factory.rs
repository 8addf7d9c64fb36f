use crate::config::{EngineBackend, EngineConfig};
use crate::engine::{InMemoryEngine, OpenSearchEngine, SearchEngine};
use crate::search::SearchResult;
use std::sync::Arc;

/// Create the search engine adapter selected by configuration
///
/// When `ensure_index` is set the products index is bootstrapped; a failure
/// there is logged rather than returned so the service can start before the
/// engine does.
pub async fn create_engine(config: &EngineConfig) -> SearchResult<Arc<dyn SearchEngine>> {
    let engine: Arc<dyn SearchEngine> = match config.backend {
        EngineBackend::OpenSearch => {
            tracing::info!(url = %config.url, index = %config.index, "Initializing OpenSearch engine backend");
            Arc::new(OpenSearchEngine::new(config)?)
        }

        EngineBackend::InMemory => create_in_memory_engine(),
    };

    if config.ensure_index {
        if let Err(e) = engine.ensure_index().await {
            tracing::warn!(error = %e, backend = engine.name(), "Index bootstrap failed, continuing");
        }
    }

    Ok(engine)
}

/// Create an in-memory engine (for testing and development)
pub fn create_in_memory_engine() -> Arc<dyn SearchEngine> {
    tracing::info!("Initializing in-memory engine backend");
    tracing::warn!("In-memory engine holds data in process memory only; ids are not shared across instances");
    Arc::new(InMemoryEngine::new())
}

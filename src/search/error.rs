//! Error types for search operations

use crate::error::AppError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur while compiling, executing or shaping a search
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Request parameters rejected before reaching the engine
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Engine could not be reached
    #[error("Search engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Engine call exceeded the transport timeout
    #[error("Search engine timed out: {0}")]
    Timeout(String),

    /// Engine answered with an error status
    #[error("Search engine failure: {0}")]
    EngineFailure(String),

    /// Engine answered with a body we could not interpret
    #[error("Malformed engine response: {0}")]
    MalformedResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Document (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchError::Timeout(err.to_string())
        } else if err.is_connect() {
            SearchError::EngineUnavailable(err.to_string())
        } else if err.is_decode() {
            SearchError::MalformedResponse(err.to_string())
        } else {
            SearchError::EngineFailure(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Serialization(err.to_string())
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidQuery(msg) => AppError::Validation(msg),
            SearchError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            _ => AppError::Internal(err.to_string()),
        }
    }
}

use crate::search::SearchConfig;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Search engine backend configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Query shaping limits and facet settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Load configuration layering the embedded defaults, the given file and the environment
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let config: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(config_path).required(false))
            // Override with environment variables (prefix: CATALOG_SEARCH__)
            .add_source(
                config::Environment::with_prefix("CATALOG_SEARCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.search.validate().map_err(config::ConfigError::Message)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine backend type
    #[serde(default)]
    pub backend: EngineBackend,

    /// Engine base URL (OpenSearch backend)
    #[serde(default = "default_engine_url")]
    pub url: String,

    /// Products index name
    #[serde(default = "default_index")]
    pub index: String,

    /// Index holding the id sequence documents
    #[serde(default = "default_sequence_index")]
    pub sequence_index: String,

    /// Per-request transport timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Basic-auth username (from env var)
    pub username_env: Option<String>,

    /// Basic-auth password (from env var)
    pub password_env: Option<String>,

    /// Make writes visible to search before returning
    #[serde(default = "default_true")]
    pub refresh_on_write: bool,

    /// Create the products index with mappings at startup when absent
    #[serde(default = "default_true")]
    pub ensure_index: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: EngineBackend::default(),
            url: default_engine_url(),
            index: default_index(),
            sequence_index: default_sequence_index(),
            timeout_secs: default_timeout(),
            username_env: None,
            password_env: None,
            refresh_on_write: true,
            ensure_index: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EngineBackend {
    OpenSearch,
    #[default]
    InMemory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_engine_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_index() -> String {
    "products".to_string()
}

fn default_sequence_index() -> String {
    "catalog-sequences".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "catalog-search".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_values() {
        assert_eq!(default_http_port(), 8080);
        assert_eq!(default_index(), "products");
        assert_eq!(default_log_level(), "info");
        assert!(default_true());
    }

    #[test]
    fn test_fallback_backend_is_in_memory() {
        let config = Config::default();
        assert_eq!(config.engine.backend, EngineBackend::InMemory);
        assert_eq!(config.search.max_page_size, 100);
    }

    #[test]
    fn test_embedded_defaults() {
        let config = Config::load_from("does/not/exist.toml").unwrap();
        assert_eq!(config.engine.backend, EngineBackend::OpenSearch);
        assert_eq!(config.engine.sequence_index, "catalog-sequences");
        assert_eq!(config.search.brand_facet_size, 15);
        assert_eq!(config.search.price_ranges.len(), 6);
        assert!(config.engine.refresh_on_write);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[engine]\nbackend = \"in_memory\"\nindex = \"catalog\"\n\n[search]\nmax_page_size = 50"
        )
        .unwrap();

        let config = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.engine.backend, EngineBackend::InMemory);
        assert_eq!(config.engine.index, "catalog");
        assert_eq!(config.search.max_page_size, 50);
        assert_eq!(config.search.default_page_size, 20);
    }

    #[test]
    fn test_invalid_search_limits_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[search]\nmax_page_size = 10\ndefault_page_size = 20").unwrap();

        assert!(Config::load_from(file.path().to_str().unwrap()).is_err());
    }
}

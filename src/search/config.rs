//! Search configuration

use serde::{Deserialize, Serialize};

/// One fixed-boundary bucket of the price-range facet.
///
/// `from` is inclusive, `to` is exclusive; `None` means unbounded on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub key: String,
    #[serde(default)]
    pub from: Option<f64>,
    #[serde(default)]
    pub to: Option<f64>,
}

impl PriceRange {
    pub fn new(key: impl Into<String>, from: Option<f64>, to: Option<f64>) -> Self {
        Self {
            key: key.into(),
            from,
            to,
        }
    }

    /// Whether `price` falls into this bucket
    pub fn contains(&self, price: f64) -> bool {
        self.from.map_or(true, |from| price >= from) && self.to.map_or(true, |to| price < to)
    }
}

/// Default price buckets: 0-50, 50-100, 100-250, 250-500, 500-1000, 1000+.
/// Not derived from the data distribution.
pub fn default_price_ranges() -> Vec<PriceRange> {
    vec![
        PriceRange::new("0-50", Some(0.0), Some(50.0)),
        PriceRange::new("50-100", Some(50.0), Some(100.0)),
        PriceRange::new("100-250", Some(100.0), Some(250.0)),
        PriceRange::new("250-500", Some(250.0), Some(500.0)),
        PriceRange::new("500-1000", Some(500.0), Some(1000.0)),
        PriceRange::new("1000-*", Some(1000.0), None),
    ]
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Largest page size a caller may request
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Deepest result (offset + page size) a caller may page to
    #[serde(default = "default_max_result_window")]
    pub max_result_window: usize,

    /// Page size used when the caller does not supply one
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Default bucket limit for the category facet
    #[serde(default = "default_category_facet_size")]
    pub category_facet_size: usize,

    /// Default bucket limit for the brand facet
    #[serde(default = "default_brand_facet_size")]
    pub brand_facet_size: usize,

    /// Buckets of the price-range facet
    #[serde(default = "default_price_ranges")]
    pub price_ranges: Vec<PriceRange>,

    /// Suggestions returned when the caller does not supply a limit
    #[serde(default = "default_suggestions")]
    pub default_suggestions: usize,

    /// Upper bound on requested suggestions
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Candidate over-fetch multiplier for suggestions (at least 3)
    #[serde(default = "default_suggestion_overfetch")]
    pub suggestion_overfetch: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
            max_result_window: default_max_result_window(),
            default_page_size: default_page_size(),
            category_facet_size: default_category_facet_size(),
            brand_facet_size: default_brand_facet_size(),
            price_ranges: default_price_ranges(),
            default_suggestions: default_suggestions(),
            max_suggestions: default_max_suggestions(),
            suggestion_overfetch: default_suggestion_overfetch(),
        }
    }
}

impl SearchConfig {
    /// Check internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.max_page_size == 0 {
            return Err("max_page_size must be greater than 0".to_string());
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(format!(
                "default_page_size must be between 1 and {}",
                self.max_page_size
            ));
        }
        if self.max_result_window < self.max_page_size {
            return Err("max_result_window must be at least max_page_size".to_string());
        }
        if self.price_ranges.is_empty() {
            return Err("price_ranges must contain at least one bucket".to_string());
        }
        for range in &self.price_ranges {
            if let (Some(from), Some(to)) = (range.from, range.to) {
                if from >= to {
                    return Err(format!("price range '{}' has from >= to", range.key));
                }
            }
        }
        if self.max_suggestions == 0 {
            return Err("max_suggestions must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Over-fetch multiplier, never below 3
    pub fn overfetch_factor(&self) -> usize {
        self.suggestion_overfetch.max(3)
    }
}

fn default_max_page_size() -> usize {
    100
}

fn default_max_result_window() -> usize {
    10_000
}

fn default_page_size() -> usize {
    20
}

fn default_category_facet_size() -> usize {
    20
}

fn default_brand_facet_size() -> usize {
    15
}

fn default_suggestions() -> usize {
    10
}

fn default_max_suggestions() -> usize {
    50
}

fn default_suggestion_overfetch() -> usize {
    3
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn max_page_size(mut self, size: usize) -> Self {
        self.config.max_page_size = size;
        self
    }

    pub fn max_result_window(mut self, window: usize) -> Self {
        self.config.max_result_window = window;
        self
    }

    pub fn default_page_size(mut self, size: usize) -> Self {
        self.config.default_page_size = size;
        self
    }

    pub fn category_facet_size(mut self, size: usize) -> Self {
        self.config.category_facet_size = size;
        self
    }

    pub fn brand_facet_size(mut self, size: usize) -> Self {
        self.config.brand_facet_size = size;
        self
    }

    pub fn price_ranges(mut self, ranges: Vec<PriceRange>) -> Self {
        self.config.price_ranges = ranges;
        self
    }

    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.config.max_suggestions = max;
        self
    }

    pub fn suggestion_overfetch(mut self, factor: usize) -> Self {
        self.config.suggestion_overfetch = factor;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

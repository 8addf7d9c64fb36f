//! Search request model

use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sort order for a sort clause
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// User-facing sort mode
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum SortMode {
    #[default]
    Relevance,
    PriceAscending,
    PriceDescending,
}

impl SortMode {
    /// Parse a sort mode. Unrecognized values fall back to relevance.
    pub fn parse(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "price_asc" | "price_ascending" | "priceasc" | "price" => SortMode::PriceAscending,
            "price_desc" | "price_descending" | "pricedesc" => SortMode::PriceDescending,
            _ => SortMode::Relevance,
        }
    }
}

impl From<String> for SortMode {
    fn from(value: String) -> Self {
        SortMode::parse(&value)
    }
}

/// Recognized field filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Exact category match
    pub category: Option<String>,

    /// Exact brand match
    pub brand: Option<String>,

    /// Inclusive lower price bound
    pub min_price: Option<f64>,

    /// Inclusive upper price bound
    pub max_price: Option<f64>,
}

impl SearchFilters {
    /// Build filters from named predicates. Unrecognized names are ignored,
    /// blank values are treated as absent.
    pub fn from_pairs<'a, I>(pairs: I) -> SearchResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut filters = SearchFilters::default();
        for (name, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match name {
                "category" => filters.category = Some(value.to_string()),
                "brand" => filters.brand = Some(value.to_string()),
                "minPrice" | "min_price" => filters.min_price = Some(parse_price(name, value)?),
                "maxPrice" | "max_price" => filters.max_price = Some(parse_price(name, value)?),
                _ => {}
            }
        }
        Ok(filters)
    }

    /// Category, if present and non-blank
    pub fn category(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    /// Brand, if present and non-blank
    pub fn brand(&self) -> Option<&str> {
        non_blank(self.brand.as_deref())
    }

    pub fn has_price_bounds(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.category().is_none() && self.brand().is_none() && !self.has_price_bounds()
    }
}

fn parse_price(name: &str, value: &str) -> SearchResult<f64> {
    let price: f64 = value
        .parse()
        .map_err(|_| SearchError::InvalidQuery(format!("{} must be a number, got '{}'", name, value)))?;
    if !price.is_finite() || price < 0.0 {
        return Err(SearchError::InvalidQuery(format!(
            "{} must be a non-negative number",
            name
        )));
    }
    Ok(price)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A normalized search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    /// Free-text query (optional)
    #[serde(default)]
    pub text: Option<String>,

    /// Field filters
    #[serde(default)]
    pub filters: SearchFilters,

    /// Sort mode
    #[serde(default)]
    pub sort: SortMode,

    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: usize,

    /// Results per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    20
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            text: None,
            filters: SearchFilters::default(),
            sort: SortMode::default(),
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl SearchQuery {
    /// Create a query for the given text
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.filters.category = Some(category.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.filters.brand = Some(brand.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.filters.min_price = min;
        self.filters.max_price = max;
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// The free-text query, if it is not blank
    pub fn text_query(&self) -> Option<&str> {
        non_blank(self.text.as_deref())
    }

    /// Engine offset for the requested page
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    /// Reject out-of-range parameters before any engine call.
    ///
    /// `max_result_window` bounds `offset + page_size`, the deepest result an
    /// engine will page to.
    pub fn validate(&self, max_page_size: usize, max_result_window: usize) -> SearchResult<()> {
        if self.page < 1 {
            return Err(SearchError::InvalidQuery("page must be >= 1".to_string()));
        }
        if self.page_size < 1 || self.page_size > max_page_size {
            return Err(SearchError::InvalidQuery(format!(
                "pageSize must be between 1 and {}",
                max_page_size
            )));
        }
        let window_end = (self.page - 1)
            .checked_mul(self.page_size)
            .and_then(|offset| offset.checked_add(self.page_size));
        if !matches!(window_end, Some(end) if end <= max_result_window) {
            return Err(SearchError::InvalidQuery(format!(
                "page * pageSize must not exceed {}",
                max_result_window
            )));
        }
        for (name, bound) in [
            ("minPrice", self.filters.min_price),
            ("maxPrice", self.filters.max_price),
        ] {
            if let Some(value) = bound {
                if !value.is_finite() || value < 0.0 {
                    return Err(SearchError::InvalidQuery(format!(
                        "{} must be a non-negative number",
                        name
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.filters.min_price, self.filters.max_price) {
            if min > max {
                return Err(SearchError::InvalidQuery(
                    "minPrice must not exceed maxPrice".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Supported facet dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetDimension {
    Category,
    Brand,
    PriceRange,
}

impl FacetDimension {
    pub const ALL: [FacetDimension; 3] = [
        FacetDimension::Category,
        FacetDimension::Brand,
        FacetDimension::PriceRange,
    ];

    /// Aggregation name used in the engine request and response
    pub fn aggregation_name(&self) -> &'static str {
        match self {
            FacetDimension::Category => "categories",
            FacetDimension::Brand => "brands",
            FacetDimension::PriceRange => "price_ranges",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "category" | "categories" => Some(FacetDimension::Category),
            "brand" | "brands" => Some(FacetDimension::Brand),
            "price_range" | "price_ranges" | "pricerange" | "price" => {
                Some(FacetDimension::PriceRange)
            }
            _ => None,
        }
    }
}

/// Search request that also asks for facet buckets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetedSearchQuery {
    #[serde(flatten)]
    pub query: SearchQuery,

    /// Requested dimensions; empty means all of them
    #[serde(default)]
    pub facets: Vec<FacetDimension>,

    /// Per-dimension bucket limits
    #[serde(default)]
    pub facet_sizes: BTreeMap<FacetDimension, usize>,
}

impl FacetedSearchQuery {
    pub fn new(query: SearchQuery) -> Self {
        Self {
            query,
            facets: Vec::new(),
            facet_sizes: BTreeMap::new(),
        }
    }

    pub fn with_facet(mut self, dimension: FacetDimension) -> Self {
        if !self.facets.contains(&dimension) {
            self.facets.push(dimension);
        }
        self
    }

    pub fn with_facet_size(mut self, dimension: FacetDimension, size: usize) -> Self {
        self.facet_sizes.insert(dimension, size);
        self
    }

    /// Requested dimensions in canonical order
    pub fn requested_dimensions(&self) -> Vec<FacetDimension> {
        FacetDimension::ALL
            .into_iter()
            .filter(|d| self.facets.is_empty() || self.facets.contains(d))
            .collect()
    }

    /// Bucket limit for `dimension`, or `default` when not requested
    pub fn facet_size(&self, dimension: FacetDimension, default: usize) -> usize {
        self.facet_sizes.get(&dimension).copied().unwrap_or(default)
    }

    pub fn validate(&self, max_page_size: usize, max_result_window: usize) -> SearchResult<()> {
        if let Some((dimension, _)) = self.facet_sizes.iter().find(|(_, size)| **size == 0) {
            return Err(SearchError::InvalidQuery(format!(
                "facet size for {:?} must be greater than 0",
                dimension
            )));
        }
        self.query.validate(max_page_size, max_result_window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_builder() {
        let query = SearchQuery::new("gaming laptop")
            .with_category("Electronics")
            .with_price_range(Some(100.0), Some(2000.0))
            .with_sort(SortMode::PriceDescending)
            .with_page(3, 25);

        assert_eq!(query.text_query(), Some("gaming laptop"));
        assert_eq!(query.filters.category(), Some("Electronics"));
        assert_eq!(query.offset(), 50);
        assert!(query.validate(100, 10_000).is_ok());
    }

    #[test]
    fn test_blank_text_is_absent() {
        assert_eq!(SearchQuery::new("   ").text_query(), None);
        assert_eq!(SearchQuery::default().text_query(), None);
    }

    #[test]
    fn test_sort_mode_parse_falls_back_to_relevance() {
        assert_eq!(SortMode::parse("price_asc"), SortMode::PriceAscending);
        assert_eq!(SortMode::parse("Price-Descending"), SortMode::PriceDescending);
        assert_eq!(SortMode::parse("relevance"), SortMode::Relevance);
        assert_eq!(SortMode::parse("popularity"), SortMode::Relevance);

        let query: SearchQuery = serde_json::from_str(r#"{"sort": "newest"}"#).unwrap();
        assert_eq!(query.sort, SortMode::Relevance);
    }

    #[test]
    fn test_filters_from_pairs() {
        let filters = SearchFilters::from_pairs([
            ("category", "Electronics"),
            ("brand", "  "),
            ("minPrice", "10"),
            ("max_price", "99.5"),
            ("color", "red"),
        ])
        .unwrap();

        assert_eq!(filters.category(), Some("Electronics"));
        assert_eq!(filters.brand(), None);
        assert_eq!(filters.min_price, Some(10.0));
        assert_eq!(filters.max_price, Some(99.5));

        assert!(SearchFilters::from_pairs([("minPrice", "cheap")]).is_err());
        assert!(SearchFilters::from_pairs([("maxPrice", "-5")]).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_pagination() {
        assert!(SearchQuery::default().with_page(0, 10).validate(100, 10_000).is_err());
        assert!(SearchQuery::default().with_page(1, 0).validate(100, 10_000).is_err());
        assert!(SearchQuery::default().with_page(1, 101).validate(100, 10_000).is_err());
    }

    #[test]
    fn test_validation_rejects_pages_past_result_window() {
        let deepest = SearchQuery::default().with_page(500, 20);
        assert!(deepest.validate(100, 10_000).is_ok());
        assert!(SearchQuery::default().with_page(501, 20).validate(100, 10_000).is_err());

        let huge = SearchQuery::default().with_page(usize::MAX, 20);
        assert!(matches!(huge.validate(100, 10_000), Err(SearchError::InvalidQuery(_))));
        assert_eq!(huge.offset(), usize::MAX);
    }

    #[test]
    fn test_validation_rejects_inverted_price_range() {
        let query = SearchQuery::default().with_price_range(Some(500.0), Some(100.0));
        assert!(query.validate(100, 10_000).is_err());
    }

    #[test]
    fn test_requested_dimensions_default_to_all() {
        let faceted = FacetedSearchQuery::new(SearchQuery::default());
        assert_eq!(faceted.requested_dimensions(), FacetDimension::ALL.to_vec());

        let only_brand = FacetedSearchQuery::new(SearchQuery::default())
            .with_facet(FacetDimension::Brand)
            .with_facet_size(FacetDimension::Brand, 5);
        assert_eq!(only_brand.requested_dimensions(), vec![FacetDimension::Brand]);
        assert_eq!(only_brand.facet_size(FacetDimension::Brand, 15), 5);
        assert_eq!(only_brand.facet_size(FacetDimension::Category, 20), 20);
    }

    #[test]
    fn test_zero_facet_size_rejected() {
        let faceted = FacetedSearchQuery::new(SearchQuery::default())
            .with_facet_size(FacetDimension::Category, 0);
        assert!(faceted.validate(100, 10_000).is_err());
    }
}

//! Shaping of raw engine responses into consumer-facing results

use crate::engine::{EngineBucket, EngineSearchResponse};
use crate::models::Product;
use crate::search::query::{FacetDimension, FacetedSearchQuery};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A product with the relevance score the engine assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    #[serde(flatten)]
    pub product: Product,

    /// Present only for free-text searches
    pub score: Option<f64>,
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    /// Total number of matches across all pages
    pub total: u64,
    pub products: Vec<ScoredProduct>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: u64,
}

impl SearchResults {
    pub fn empty(page: usize, page_size: usize) -> Self {
        Self {
            total: 0,
            products: Vec::new(),
            page,
            page_size,
            total_pages: 0,
        }
    }
}

/// A facet value (or range) with its document count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetBucket {
    pub key: String,
    pub count: u64,

    /// Inclusive lower bound (price ranges only; absent when unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,

    /// Exclusive upper bound (price ranges only; absent when unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
}

/// Facet buckets per dimension. Dimensions that were not requested are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facets {
    pub categories: Vec<FacetBucket>,
    pub brands: Vec<FacetBucket>,
    pub price_ranges: Vec<FacetBucket>,
}

/// Search results plus facet buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetedSearchResults {
    #[serde(flatten)]
    pub results: SearchResults,
    pub facets: Facets,
}

/// ceil(total / page_size)
pub fn total_pages(total: u64, page_size: usize) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64)
}

/// Shape a plain search response.
///
/// Scores are looked up by document id in the raw hit metadata, never by
/// position, and are only attached when `include_scores` is set.
pub fn shape_search(
    response: EngineSearchResponse,
    page: usize,
    page_size: usize,
    include_scores: bool,
) -> SearchResults {
    let scores: HashMap<String, Option<f64>> = response
        .hits
        .into_iter()
        .map(|hit| (hit.id, hit.score))
        .collect();

    let products = response
        .documents
        .into_iter()
        .map(|product| {
            let score = if include_scores {
                scores.get(&product.document_id()).copied().flatten()
            } else {
                None
            };
            ScoredProduct { product, score }
        })
        .collect();

    SearchResults {
        total: response.total,
        products,
        page,
        page_size,
        total_pages: total_pages(response.total, page_size),
    }
}

/// Map aggregation buckets to facet buckets for the requested dimensions
pub fn shape_facets(
    aggregations: &HashMap<String, Vec<EngineBucket>>,
    dimensions: &[FacetDimension],
) -> Facets {
    let mut facets = Facets::default();
    for dimension in dimensions {
        let buckets = aggregations
            .get(dimension.aggregation_name())
            .map(|buckets| buckets.iter().map(|b| to_facet_bucket(b, *dimension)).collect())
            .unwrap_or_default();
        match dimension {
            FacetDimension::Category => facets.categories = buckets,
            FacetDimension::Brand => facets.brands = buckets,
            FacetDimension::PriceRange => facets.price_ranges = buckets,
        }
    }
    facets
}

fn to_facet_bucket(bucket: &EngineBucket, dimension: FacetDimension) -> FacetBucket {
    let (from, to) = match dimension {
        FacetDimension::PriceRange => (bucket.from, bucket.to),
        _ => (None, None),
    };
    FacetBucket {
        key: bucket.key.clone(),
        count: bucket.doc_count,
        from,
        to,
    }
}

/// Shape a faceted search response
pub fn shape_faceted(response: EngineSearchResponse, query: &FacetedSearchQuery) -> FacetedSearchResults {
    let facets = shape_facets(&response.aggregations, &query.requested_dimensions());
    let results = shape_search(
        response,
        query.query.page,
        query.query.page_size,
        query.query.text_query().is_some(),
    );
    FacetedSearchResults { results, facets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineHit;
    use crate::search::query::SearchQuery;
    use chrono::Utc;

    fn product(id: u64, title: &str, price: f64) -> Product {
        Product {
            id,
            title: title.to_string(),
            description: String::new(),
            category: "Electronics".to_string(),
            brand: "TechBrand".to_string(),
            price,
            attributes: None,
            created_at: Utc::now(),
            is_active: true,
        }
    }

    fn hit(id: &str, score: f64) -> EngineHit {
        EngineHit {
            id: id.to_string(),
            score: Some(score),
        }
    }

    #[test]
    fn test_scores_correlated_by_id_not_position() {
        let response = EngineSearchResponse {
            total: 2,
            hits: vec![hit("2", 0.5), hit("1", 3.25)],
            documents: vec![product(1, "Gaming Laptop", 1299.99), product(2, "Mouse", 79.99)],
            aggregations: HashMap::new(),
        };

        let results = shape_search(response, 1, 10, true);

        assert_eq!(results.products[0].product.id, 1);
        assert_eq!(results.products[0].score, Some(3.25));
        assert_eq!(results.products[1].score, Some(0.5));
    }

    #[test]
    fn test_scores_omitted_without_text_query() {
        let response = EngineSearchResponse {
            total: 1,
            hits: vec![hit("1", 1.0)],
            documents: vec![product(1, "Gaming Laptop", 1299.99)],
            aggregations: HashMap::new(),
        };

        let results = shape_search(response, 1, 10, false);
        assert_eq!(results.products[0].score, None);
    }

    #[test]
    fn test_empty_response_is_well_formed() {
        let results = shape_search(EngineSearchResponse::default(), 1, 20, true);

        assert_eq!(results.total, 0);
        assert!(results.products.is_empty());
        assert_eq!(results.total_pages, 0);
        assert_eq!(results, SearchResults::empty(1, 20));
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(1, 100), 1);
    }

    #[test]
    fn test_price_buckets_keep_bounds_verbatim() {
        let mut aggregations = HashMap::new();
        aggregations.insert(
            "categories".to_string(),
            vec![EngineBucket {
                key: "Electronics".to_string(),
                doc_count: 2,
                from: None,
                to: None,
            }],
        );
        aggregations.insert(
            "price_ranges".to_string(),
            vec![
                EngineBucket {
                    key: "50-100".to_string(),
                    doc_count: 1,
                    from: Some(50.0),
                    to: Some(100.0),
                },
                EngineBucket {
                    key: "1000-*".to_string(),
                    doc_count: 1,
                    from: Some(1000.0),
                    to: None,
                },
            ],
        );

        let facets = shape_facets(&aggregations, &FacetDimension::ALL);

        assert_eq!(facets.categories[0].key, "Electronics");
        assert_eq!(facets.categories[0].count, 2);
        assert_eq!(facets.categories[0].from, None);
        assert!(facets.brands.is_empty());
        assert_eq!(facets.price_ranges[0].from, Some(50.0));
        assert_eq!(facets.price_ranges[0].to, Some(100.0));
        assert_eq!(facets.price_ranges[1].to, None);
    }

    #[test]
    fn test_unrequested_dimensions_stay_empty() {
        let mut aggregations = HashMap::new();
        aggregations.insert(
            "brands".to_string(),
            vec![EngineBucket {
                key: "Razer".to_string(),
                doc_count: 4,
                from: None,
                to: None,
            }],
        );

        let faceted = FacetedSearchQuery::new(SearchQuery::default()).with_facet(FacetDimension::Category);
        let response = EngineSearchResponse {
            aggregations,
            ..Default::default()
        };

        let shaped = shape_faceted(response, &faceted);
        assert!(shaped.facets.brands.is_empty());
        assert!(shaped.facets.categories.is_empty());
        assert_eq!(shaped.results.total_pages, 0);
    }

    #[test]
    fn test_score_serializes_as_null_when_absent() {
        let scored = ScoredProduct {
            product: product(1, "Gaming Laptop", 1299.99),
            score: None,
        };
        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["title"], "Gaming Laptop");
        assert!(json["score"].is_null());
    }
}

//! Catalog scenarios against the in-memory engine

use catalog_search::catalog::CatalogService;
use catalog_search::engine::InMemoryEngine;
use catalog_search::models::{CreateProductRequest, UpdateProductRequest};
use catalog_search::search::{
    FacetDimension, FacetedSearchQuery, SearchConfig, SearchQuery, SortMode, SuggestionMetadata,
    SuggestionType,
};
use catalog_search::AppError;
use std::collections::HashSet;
use std::sync::Arc;

fn service() -> CatalogService {
    CatalogService::new(Arc::new(InMemoryEngine::new()), SearchConfig::default())
}

fn product(title: &str, category: &str, brand: &str, price: f64) -> CreateProductRequest {
    CreateProductRequest {
        title: title.to_string(),
        description: format!("{} by {}", title, brand),
        category: category.to_string(),
        brand: brand.to_string(),
        price,
        attributes: None,
    }
}

async fn seeded() -> CatalogService {
    let service = service();
    for request in [
        product("Gaming Laptop", "Electronics", "TechBrand", 1299.99),
        product("Wireless Mouse", "Electronics", "TechBrand", 79.99),
        product("Oak Desk", "Furniture", "Woodworks", 349.0),
        product("Desk Lamp", "Furniture", "Brightly", 39.5),
        product("Mechanical Keyboard", "Electronics", "KeyCo", 149.0),
    ] {
        service.create(request).await.unwrap();
    }
    service
}

#[tokio::test]
async fn test_empty_catalog_search() {
    let results = service().search(&SearchQuery::new("gaming")).await.unwrap();

    assert_eq!(results.total, 0);
    assert!(results.products.is_empty());
    assert_eq!(results.total_pages, 0);
}

#[tokio::test]
async fn test_blank_query_matches_every_active_product() {
    let service = seeded().await;
    service.delete(3).await.unwrap();

    let results = service.search(&SearchQuery::new("   ")).await.unwrap();
    assert_eq!(results.total, 4);
    assert!(results.products.iter().all(|p| p.score.is_none()));
    assert!(results.products.iter().all(|p| p.product.id != 3));
}

#[tokio::test]
async fn test_text_search_attaches_scores() {
    let service = seeded().await;

    let results = service.search(&SearchQuery::new("laptop")).await.unwrap();
    assert_eq!(results.total, 1);
    assert_eq!(results.products[0].product.title, "Gaming Laptop");
    assert!(results.products[0].score.is_some());
}

#[tokio::test]
async fn test_price_bounds_are_inclusive() {
    let service = seeded().await;

    let query = SearchQuery::default()
        .with_price_range(Some(79.99), Some(349.0))
        .with_sort(SortMode::PriceAscending);
    let results = service.search(&query).await.unwrap();

    let prices: Vec<f64> = results.products.iter().map(|p| p.product.price).collect();
    assert_eq!(prices, vec![79.99, 149.0, 349.0]);
}

#[tokio::test]
async fn test_one_sided_price_bound() {
    let service = seeded().await;

    let query = SearchQuery::default()
        .with_price_range(None, Some(100.0))
        .with_sort(SortMode::PriceDescending);
    let results = service.search(&query).await.unwrap();

    assert_eq!(results.total, 2);
    assert!(results.products.iter().all(|p| p.product.price <= 100.0));
    assert_eq!(results.products[0].product.price, 79.99);
}

#[tokio::test]
async fn test_invalid_price_range_rejected() {
    let query = SearchQuery::default().with_price_range(Some(500.0), Some(100.0));
    let result = seeded().await.search(&query).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_pagination_pages_are_disjoint() {
    let service = seeded().await;

    let first = service.list(1, 2).await.unwrap();
    let second = service.list(2, 2).await.unwrap();
    let third = service.list(3, 2).await.unwrap();

    assert_eq!(first.total, 5);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.products.len(), 2);
    assert_eq!(third.products.len(), 1);

    let mut seen = HashSet::new();
    for page in [&first, &second, &third] {
        for item in &page.products {
            assert!(seen.insert(item.product.id), "product {} repeated", item.product.id);
        }
    }
    assert_eq!(seen.len(), 5);
}

#[tokio::test]
async fn test_faceted_search_for_category() {
    let service = service();
    service
        .create(product("Gaming Laptop", "Electronics", "TechBrand", 1299.99))
        .await
        .unwrap();
    service
        .create(product("Wireless Mouse", "Electronics", "TechBrand", 79.99))
        .await
        .unwrap();

    let query = FacetedSearchQuery::new(SearchQuery::default().with_category("Electronics"));
    let results = service.faceted_search(&query).await.unwrap();

    assert_eq!(results.results.total, 2);
    assert_eq!(results.facets.categories.len(), 1);
    assert_eq!(results.facets.categories[0].key, "Electronics");
    assert_eq!(results.facets.categories[0].count, 2);

    let bucket = |key: &str| {
        results
            .facets
            .price_ranges
            .iter()
            .find(|b| b.key == key)
            .unwrap()
            .clone()
    };
    assert_eq!(bucket("1000-*").count, 1);
    assert_eq!(bucket("1000-*").to, None);
    assert_eq!(bucket("50-100").count, 1);
    assert_eq!(bucket("50-100").from, Some(50.0));
    assert_eq!(bucket("0-50").count, 0);
}

#[tokio::test]
async fn test_faceted_search_selected_dimensions() {
    let service = seeded().await;

    let query = FacetedSearchQuery::new(SearchQuery::default())
        .with_facet(FacetDimension::Brand)
        .with_facet_size(FacetDimension::Brand, 1);
    let results = service.faceted_search(&query).await.unwrap();

    assert!(results.facets.categories.is_empty());
    assert!(results.facets.price_ranges.is_empty());
    assert_eq!(results.facets.brands.len(), 1);
    assert_eq!(results.facets.brands[0].key, "TechBrand");
    assert_eq!(results.facets.brands[0].count, 2);
}

#[tokio::test]
async fn test_suggestions_prefer_titles() {
    let service = service();
    service
        .create(product("Gaming Laptop", "Electronics", "TechBrand", 1299.99))
        .await
        .unwrap();
    service
        .create(product("Gaming Mouse", "Electronics", "Razer", 59.99))
        .await
        .unwrap();

    let suggestions = service.suggest("gam", None).await.unwrap();

    let texts: Vec<&str> = suggestions.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["Gaming Laptop", "Gaming Mouse"]);
    assert_eq!(suggestions[0].kind, SuggestionType::Product);
    assert_eq!(
        suggestions[0].metadata,
        SuggestionMetadata::Product {
            category: "Electronics".to_string(),
            brand: "TechBrand".to_string(),
        }
    );
}

#[tokio::test]
async fn test_brand_suggestions_are_deduplicated() {
    let service = service();
    for title in ["Alpha", "Beta", "Gamma"] {
        service
            .create(product(title, "Audio", "Sonic", 10.0))
            .await
            .unwrap();
    }

    let suggestions = service.suggest("son", Some(10)).await.unwrap();

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].kind, SuggestionType::Brand);
    assert_eq!(
        suggestions[0].metadata,
        SuggestionMetadata::Count { product_count: 3 }
    );
}

#[tokio::test]
async fn test_soft_deleted_products_leave_every_read_path() {
    let service = seeded().await;
    service.delete(1).await.unwrap();

    assert!(matches!(service.get(1).await, Err(AppError::NotFound(_))));
    assert_eq!(service.search(&SearchQuery::new("gaming")).await.unwrap().total, 0);
    assert!(service.suggest("gam", None).await.unwrap().is_empty());

    let facets = service
        .faceted_search(&FacetedSearchQuery::new(SearchQuery::default()))
        .await
        .unwrap();
    let over_1000 = facets
        .facets
        .price_ranges
        .iter()
        .find(|b| b.key == "1000-*")
        .unwrap();
    assert_eq!(over_1000.count, 0);

    let update = UpdateProductRequest {
        price: Some(999.0),
        ..Default::default()
    };
    assert!(matches!(service.update(1, update).await, Err(AppError::NotFound(_))));
}

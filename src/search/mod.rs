//! Query construction and result shaping for catalog search
//!
//! This module translates user-facing search parameters into engine requests
//! and reshapes raw engine responses into stable result structures:
//!
//! - **Query Model** (`query`): text, filters, sort mode, pagination, facets
//! - **Query Compiler** (`compiler`): boolean must/filter composition, range
//!   filters, sort clauses, terms/range aggregations, weighted prefix queries
//! - **Result Shaper** (`shaper`): paged hits with scores, facet buckets
//! - **Suggestion Extractor** (`suggest`): ranked, deduplicated autocomplete
//!
//! # Data flow
//!
//! ```text
//! request params ──► SearchQuery ──► QueryCompiler ──► SearchRequest
//!                                                          │
//!                                                          ▼
//!                                                  SearchEngine (port)
//!                                                          │
//!                                                          ▼
//! SearchResults / FacetedSearchResults / Vec<Suggestion> ◄── EngineSearchResponse
//! ```
//!
//! Everything here is synchronous and pure; the only I/O happens behind the
//! [`crate::engine::SearchEngine`] port.
//!
//! # Example
//!
//! ```
//! use catalog_search::search::{QueryCompiler, SearchConfig, SearchQuery, SortMode};
//!
//! let compiler = QueryCompiler::new(SearchConfig::default());
//! let query = SearchQuery::new("gaming laptop")
//!     .with_category("Electronics")
//!     .with_sort(SortMode::PriceAscending)
//!     .with_page(2, 10);
//!
//! let request = compiler.compile(&query);
//! assert_eq!(request.from, 10);
//! assert_eq!(request.size, 10);
//! ```

mod compiler;
mod config;
mod error;
mod query;
mod shaper;
mod suggest;

pub use compiler::{
    active_only, Aggregation, BoolClause, BoostedField, Clause, QueryCompiler, SearchRequest,
    SortClause, BRAND_PREFIX_BOOST, CATEGORY_PREFIX_BOOST, DESCRIPTION_TEXT_BOOST,
    TITLE_PREFIX_BOOST, TITLE_TEXT_BOOST,
};
pub use config::{default_price_ranges, PriceRange, SearchConfig, SearchConfigBuilder};
pub use error::{SearchError, SearchResult};
pub use query::{FacetDimension, FacetedSearchQuery, SearchFilters, SearchQuery, SortMode, SortOrder};
pub use shaper::{
    shape_facets, shape_faceted, shape_search, total_pages, FacetBucket, FacetedSearchResults,
    Facets, ScoredProduct, SearchResults,
};
pub use suggest::{extract_suggestions, Suggestion, SuggestionMetadata, SuggestionType};

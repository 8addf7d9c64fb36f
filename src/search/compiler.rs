//! Compilation of search requests into engine queries
//!
//! The compiler is pure: it produces a typed [`SearchRequest`] that each
//! engine adapter translates to its own wire format. Nothing here performs I/O,
//! so the compiled structure can be asserted directly in tests.

use crate::models::fields;
use crate::search::config::{PriceRange, SearchConfig};
use crate::search::query::{FacetDimension, FacetedSearchQuery, SearchQuery, SortMode, SortOrder};
use serde_json::Value;

/// Relative weight of title over description in full-text matching
pub const TITLE_TEXT_BOOST: f32 = 2.0;
pub const DESCRIPTION_TEXT_BOOST: f32 = 1.0;

/// Per-field weights for prefix suggestions
pub const TITLE_PREFIX_BOOST: f32 = 3.0;
pub const BRAND_PREFIX_BOOST: f32 = 2.0;
pub const CATEGORY_PREFIX_BOOST: f32 = 1.0;

/// A field with a relevance weight
#[derive(Debug, Clone, PartialEq)]
pub struct BoostedField {
    pub field: String,
    pub boost: f32,
}

impl BoostedField {
    pub fn new(field: &str, boost: f32) -> Self {
        Self {
            field: field.to_string(),
            boost,
        }
    }
}

/// Boolean composition of clauses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolClause {
    /// Scoring clauses that must all match
    pub must: Vec<Clause>,
    /// Non-scoring clauses that must all match
    pub filter: Vec<Clause>,
    /// Scoring clauses of which `minimum_should_match` must match
    pub should: Vec<Clause>,
    pub minimum_should_match: Option<u32>,
}

/// Engine-neutral query clause
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    MatchAll,
    /// Relevance match across several text fields, optionally typo tolerant
    MultiMatch {
        query: String,
        fields: Vec<BoostedField>,
        fuzzy: bool,
    },
    /// Exact value match
    Term { field: String, value: Value },
    /// Inclusive numeric range
    Range {
        field: String,
        gte: Option<f64>,
        lte: Option<f64>,
    },
    /// Case-insensitive prefix match
    Prefix {
        field: String,
        value: String,
        boost: f32,
    },
    Bool(BoolClause),
}

/// Sort clause
#[derive(Debug, Clone, PartialEq)]
pub enum SortClause {
    /// Descending relevance score
    Score,
    Field { field: String, order: SortOrder },
}

/// Aggregation request
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// Count-descending term buckets
    Terms {
        name: String,
        field: String,
        size: usize,
    },
    /// Fixed-boundary numeric buckets
    Range {
        name: String,
        field: String,
        ranges: Vec<PriceRange>,
    },
}

impl Aggregation {
    pub fn name(&self) -> &str {
        match self {
            Aggregation::Terms { name, .. } | Aggregation::Range { name, .. } => name,
        }
    }
}

/// A compiled, engine-neutral search request
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: Clause,
    pub sort: Vec<SortClause>,
    pub from: usize,
    pub size: usize,
    pub aggregations: Vec<Aggregation>,
}

/// Clause restricting results to active products
pub fn active_only() -> Clause {
    Clause::Term {
        field: fields::IS_ACTIVE.to_string(),
        value: Value::Bool(true),
    }
}

/// Builds engine requests from search queries
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    config: SearchConfig,
}

impl QueryCompiler {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Compile a plain search query
    pub fn compile(&self, query: &SearchQuery) -> SearchRequest {
        SearchRequest {
            query: self.compile_clause(query),
            sort: compile_sort(query.sort),
            from: query.offset(),
            size: query.page_size,
            aggregations: Vec::new(),
        }
    }

    /// Compile a search query together with its facet aggregations
    pub fn compile_faceted(&self, faceted: &FacetedSearchQuery) -> SearchRequest {
        let mut request = self.compile(&faceted.query);
        request.aggregations = faceted
            .requested_dimensions()
            .into_iter()
            .map(|dimension| self.compile_aggregation(faceted, dimension))
            .collect();
        request
    }

    /// Compile a weighted prefix query over title, brand and category.
    ///
    /// Requests `limit * overfetch` candidates so enough distinct texts remain
    /// after deduplication.
    pub fn compile_suggest(&self, prefix: &str, limit: usize) -> SearchRequest {
        let value = prefix.trim().to_lowercase();
        let should = [
            (fields::TITLE, TITLE_PREFIX_BOOST),
            (fields::BRAND, BRAND_PREFIX_BOOST),
            (fields::CATEGORY, CATEGORY_PREFIX_BOOST),
        ]
        .into_iter()
        .map(|(field, boost)| Clause::Prefix {
            field: field.to_string(),
            value: value.clone(),
            boost,
        })
        .collect();

        SearchRequest {
            query: Clause::Bool(BoolClause {
                must: Vec::new(),
                filter: vec![active_only()],
                should,
                minimum_should_match: Some(1),
            }),
            sort: compile_sort(SortMode::Relevance),
            from: 0,
            size: limit.saturating_mul(self.config.overfetch_factor()),
            aggregations: Vec::new(),
        }
    }

    fn compile_clause(&self, query: &SearchQuery) -> Clause {
        let must = match query.text_query() {
            Some(text) => Clause::MultiMatch {
                query: text.to_string(),
                fields: vec![
                    BoostedField::new(fields::TITLE, TITLE_TEXT_BOOST),
                    BoostedField::new(fields::DESCRIPTION, DESCRIPTION_TEXT_BOOST),
                ],
                fuzzy: true,
            },
            None => Clause::MatchAll,
        };

        // Active-only always comes first
        let mut filter = vec![active_only()];

        if let Some(category) = query.filters.category() {
            filter.push(Clause::Term {
                field: fields::CATEGORY.to_string(),
                value: Value::from(category),
            });
        }
        if let Some(brand) = query.filters.brand() {
            filter.push(Clause::Term {
                field: fields::BRAND.to_string(),
                value: Value::from(brand),
            });
        }
        if query.filters.has_price_bounds() {
            filter.push(Clause::Range {
                field: fields::PRICE.to_string(),
                gte: query.filters.min_price,
                lte: query.filters.max_price,
            });
        }

        Clause::Bool(BoolClause {
            must: vec![must],
            filter,
            should: Vec::new(),
            minimum_should_match: None,
        })
    }

    fn compile_aggregation(&self, faceted: &FacetedSearchQuery, dimension: FacetDimension) -> Aggregation {
        let name = dimension.aggregation_name().to_string();
        match dimension {
            FacetDimension::Category => Aggregation::Terms {
                name,
                field: fields::CATEGORY.to_string(),
                size: faceted.facet_size(dimension, self.config.category_facet_size),
            },
            FacetDimension::Brand => Aggregation::Terms {
                name,
                field: fields::BRAND.to_string(),
                size: faceted.facet_size(dimension, self.config.brand_facet_size),
            },
            FacetDimension::PriceRange => Aggregation::Range {
                name,
                field: fields::PRICE.to_string(),
                ranges: self.config.price_ranges.clone(),
            },
        }
    }
}

fn compile_sort(mode: SortMode) -> Vec<SortClause> {
    let primary = match mode {
        SortMode::Relevance => SortClause::Score,
        SortMode::PriceAscending => SortClause::Field {
            field: fields::PRICE.to_string(),
            order: SortOrder::Ascending,
        },
        SortMode::PriceDescending => SortClause::Field {
            field: fields::PRICE.to_string(),
            order: SortOrder::Descending,
        },
    };
    // id tiebreaker keeps pages disjoint
    vec![
        primary,
        SortClause::Field {
            field: fields::ID.to_string(),
            order: SortOrder::Ascending,
        },
    ]
}

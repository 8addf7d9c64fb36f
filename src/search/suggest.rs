//! Autocomplete suggestion extraction
//!
//! Candidates come from the weighted prefix query built by
//! [`crate::search::QueryCompiler::compile_suggest`] and are walked in the
//! engine's relevance order. Product counts for brand and category
//! suggestions are computed over the fetched candidates only, so they are an
//! approximation of the catalog-wide counts.

use crate::models::Product;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// What a suggestion refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuggestionType {
    Product,
    Brand,
    Category,
}

/// Type-specific suggestion details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SuggestionMetadata {
    /// Where a product suggestion lives in the catalog
    Product { category: String, brand: String },
    /// Number of candidates sharing a brand or category
    Count {
        #[serde(rename = "productCount")]
        product_count: usize,
    },
}

/// A single autocomplete suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub metadata: SuggestionMetadata,
}

/// Extract up to `limit` suggestions for `prefix` from `candidates`.
///
/// Each document may contribute its title, brand and category (in that
/// order) when they start with the prefix, ignoring case. Texts are
/// deduplicated case-insensitively; the first occurrence wins.
pub fn extract_suggestions(prefix: &str, candidates: &[Product], limit: usize) -> Vec<Suggestion> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() || limit == 0 {
        return Vec::new();
    }

    let brand_counts = count_by(candidates, |p| &p.brand);
    let category_counts = count_by(candidates, |p| &p.category);

    let mut seen = HashSet::new();
    let mut suggestions = Vec::with_capacity(limit);

    for product in candidates {
        let options = [
            (
                &product.title,
                SuggestionType::Product,
                SuggestionMetadata::Product {
                    category: product.category.clone(),
                    brand: product.brand.clone(),
                },
            ),
            (
                &product.brand,
                SuggestionType::Brand,
                SuggestionMetadata::Count {
                    product_count: lookup(&brand_counts, &product.brand),
                },
            ),
            (
                &product.category,
                SuggestionType::Category,
                SuggestionMetadata::Count {
                    product_count: lookup(&category_counts, &product.category),
                },
            ),
        ];

        for (text, kind, metadata) in options {
            let normalized = text.to_lowercase();
            if !normalized.starts_with(&prefix) || !seen.insert(normalized) {
                continue;
            }
            suggestions.push(Suggestion {
                text: text.clone(),
                kind,
                metadata,
            });
            if suggestions.len() >= limit {
                return suggestions;
            }
        }
    }

    suggestions
}

fn count_by<F>(candidates: &[Product], field: F) -> HashMap<String, usize>
where
    F: Fn(&Product) -> &String,
{
    let mut counts = HashMap::new();
    for product in candidates {
        *counts.entry(field(product).to_lowercase()).or_insert(0) += 1;
    }
    counts
}

fn lookup(counts: &HashMap<String, usize>, value: &str) -> usize {
    counts.get(&value.to_lowercase()).copied().unwrap_or(0)
}

//! In-process engine adapter
//!
//! Evaluates the same compiled [`SearchRequest`] the OpenSearch adapter sends
//! over the wire, against documents held in a `DashMap`. Intended for
//! development and tests. Identifiers come from an in-process counter, so this
//! adapter must not back more than one service instance.

use crate::engine::{BulkIndexReport, BulkItemError, EngineBucket, EngineHit, EngineSearchResponse, SearchEngine};
use crate::models::{fields, Product};
use crate::search::{
    Aggregation, BoolClause, BoostedField, Clause, SearchError, SearchRequest, SearchResult,
    SortClause, SortOrder,
};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use validator::Validate;

/// Fields tokenized like analyzed text fields; all others match as keywords
const TEXT_FIELDS: [&str; 2] = [fields::TITLE, fields::DESCRIPTION];

/// Score of a term that only matched within the fuzzy edit distance
const FUZZY_MATCH_SCORE: f64 = 0.5;

/// In-memory search engine
#[derive(Clone, Default)]
pub struct InMemoryEngine {
    documents: Arc<DashMap<u64, Product>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine pre-loaded with `products`
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let engine = Self::new();
        for product in products {
            engine.sequence.fetch_max(product.id, AtomicOrdering::SeqCst);
            engine.documents.insert(product.id, product);
        }
        engine
    }

    /// Number of stored documents, including inactive ones
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn store(&self, product: &Product) -> Result<(), String> {
        product.validate().map_err(|e| e.to_string())?;
        if !product.price.is_finite() {
            return Err("price must be finite".to_string());
        }
        self.documents.insert(product.id, product.clone());
        Ok(())
    }
}

#[async_trait]
impl SearchEngine for InMemoryEngine {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn ensure_index(&self) -> SearchResult<()> {
        Ok(())
    }

    async fn next_id(&self) -> SearchResult<u64> {
        Ok(self.sequence.fetch_add(1, AtomicOrdering::SeqCst) + 1)
    }

    async fn index_document(&self, product: &Product) -> SearchResult<u64> {
        self.store(product)
            .map_err(|reason| SearchError::EngineFailure(format!("document rejected: {}", reason)))?;
        tracing::debug!(product_id = product.id, "Document indexed in memory");
        Ok(product.id)
    }

    async fn bulk_index(&self, products: &[Product]) -> SearchResult<BulkIndexReport> {
        let errors = products
            .iter()
            .enumerate()
            .filter_map(|(index, product)| {
                self.store(product).err().map(|reason| BulkItemError {
                    index,
                    id: Some(product.id),
                    reason,
                })
            })
            .collect();
        Ok(BulkIndexReport::from_errors(products.len(), errors))
    }

    async fn get_document(&self, id: u64) -> SearchResult<Option<Product>> {
        Ok(self.documents.get(&id).map(|entry| entry.clone()))
    }

    async fn update_document(&self, id: u64, partial: &Value) -> SearchResult<bool> {
        let Some(mut entry) = self.documents.get_mut(&id) else {
            return Ok(false);
        };

        let mut merged = serde_json::to_value(&*entry)?;
        if let (Value::Object(target), Value::Object(source)) = (&mut merged, partial) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        } else {
            return Err(SearchError::InvalidQuery(
                "partial update must be a JSON object".to_string(),
            ));
        }

        *entry = serde_json::from_value(merged)?;
        Ok(true)
    }

    async fn delete_document(&self, id: u64) -> SearchResult<bool> {
        Ok(self.documents.remove(&id).is_some())
    }

    async fn search(&self, request: &SearchRequest) -> SearchResult<EngineSearchResponse> {
        let mut matched = Vec::new();
        for entry in self.documents.iter() {
            let doc = serde_json::to_value(entry.value())?;
            if let Some(score) = evaluate(&request.query, &doc) {
                matched.push((score, doc, entry.value().clone()));
            }
        }

        matched.sort_by(|a, b| compare(&request.sort, (a.0, &a.1), (b.0, &b.1)));

        let mut aggregations = HashMap::new();
        for aggregation in &request.aggregations {
            let docs: Vec<&Value> = matched.iter().map(|(_, doc, _)| doc).collect();
            aggregations.insert(aggregation.name().to_string(), aggregate(aggregation, &docs));
        }

        let total = matched.len() as u64;
        let (hits, documents): (Vec<EngineHit>, Vec<Product>) = matched
            .into_iter()
            .skip(request.from)
            .take(request.size)
            .map(|(score, _, product)| {
                (
                    EngineHit {
                        id: product.document_id(),
                        score: Some(score),
                    },
                    product,
                )
            })
            .unzip();

        Ok(EngineSearchResponse {
            total,
            hits,
            documents,
            aggregations,
        })
    }

    async fn health_check(&self) -> bool {
        true
    }
}

/// Score of `doc` under `clause`, or `None` when it does not match
fn evaluate(clause: &Clause, doc: &Value) -> Option<f64> {
    match clause {
        Clause::MatchAll => Some(1.0),
        Clause::Term { field, value } => (doc.get(field) == Some(value)).then_some(1.0),
        Clause::Range { field, gte, lte } => {
            let number = doc.get(field)?.as_f64()?;
            let above = gte.map_or(true, |min| number >= min);
            let below = lte.map_or(true, |max| number <= max);
            (above && below).then_some(1.0)
        }
        Clause::Prefix { field, value, boost } => {
            let text = doc.get(field)?.as_str()?;
            let prefix = value.to_lowercase();
            let hit = if TEXT_FIELDS.contains(&field.as_str()) {
                tokenize(text).iter().any(|token| token.starts_with(&prefix))
            } else {
                text.to_lowercase().starts_with(&prefix)
            };
            hit.then_some(f64::from(*boost))
        }
        Clause::MultiMatch { query, fields, fuzzy } => multi_match(query, fields, *fuzzy, doc),
        Clause::Bool(b) => evaluate_bool(b, doc),
    }
}

fn evaluate_bool(clause: &BoolClause, doc: &Value) -> Option<f64> {
    let mut score = 0.0;
    for must in &clause.must {
        score += evaluate(must, doc)?;
    }
    for filter in &clause.filter {
        evaluate(filter, doc)?;
    }

    let mut matched_should = 0;
    for should in &clause.should {
        if let Some(s) = evaluate(should, doc) {
            matched_should += 1;
            score += s;
        }
    }
    let required = clause.minimum_should_match.unwrap_or(
        if clause.must.is_empty() && clause.filter.is_empty() && !clause.should.is_empty() {
            1
        } else {
            0
        },
    );
    (matched_should >= required).then_some(score)
}

/// Best-field multi-match: the highest weighted field score wins
fn multi_match(query: &str, fields: &[BoostedField], fuzzy: bool, doc: &Value) -> Option<f64> {
    let terms = tokenize(query);
    if terms.is_empty() {
        return None;
    }

    let best = fields
        .iter()
        .filter_map(|f| {
            let tokens = tokenize(doc.get(&f.field)?.as_str()?);
            let matched: f64 = terms.iter().map(|t| term_score(t, &tokens, fuzzy)).sum();
            Some(matched / terms.len() as f64 * f64::from(f.boost))
        })
        .fold(0.0, f64::max);

    (best > 0.0).then_some(best)
}

fn term_score(term: &str, tokens: &[String], fuzzy: bool) -> f64 {
    if tokens.iter().any(|t| t == term) {
        return 1.0;
    }
    let max_edits = allowed_edits(term);
    if fuzzy && max_edits > 0 && tokens.iter().any(|t| levenshtein(term, t) <= max_edits) {
        return FUZZY_MATCH_SCORE;
    }
    0.0
}

/// Edit distance allowed for a term, following the engine's AUTO fuzziness
fn allowed_edits(term: &str) -> usize {
    match term.chars().count() {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != *cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        previous = current;
    }
    previous[b.len()]
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn compare(sort: &[SortClause], a: (f64, &Value), b: (f64, &Value)) -> Ordering {
    for clause in sort {
        let ordering = match clause {
            SortClause::Score => b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal),
            SortClause::Field { field, order } => {
                let ordering = compare_values(a.1.get(field), b.1.get(field));
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            }
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn aggregate(aggregation: &Aggregation, docs: &[&Value]) -> Vec<EngineBucket> {
    match aggregation {
        Aggregation::Terms { field, size, .. } => {
            let mut counts: HashMap<String, u64> = HashMap::new();
            for doc in docs {
                if let Some(key) = doc.get(field).and_then(Value::as_str) {
                    *counts.entry(key.to_string()).or_insert(0) += 1;
                }
            }
            let mut buckets: Vec<EngineBucket> = counts
                .into_iter()
                .map(|(key, doc_count)| EngineBucket {
                    key,
                    doc_count,
                    from: None,
                    to: None,
                })
                .collect();
            buckets.sort_by(|a, b| b.doc_count.cmp(&a.doc_count).then_with(|| a.key.cmp(&b.key)));
            buckets.truncate(*size);
            buckets
        }
        Aggregation::Range { field, ranges, .. } => ranges
            .iter()
            .map(|range| EngineBucket {
                key: range.key.clone(),
                doc_count: docs
                    .iter()
                    .filter_map(|doc| doc.get(field).and_then(Value::as_f64))
                    .filter(|value| range.contains(*value))
                    .count() as u64,
                from: range.from,
                to: range.to,
            })
            .collect(),
    }
}

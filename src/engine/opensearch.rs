//! OpenSearch / Elasticsearch REST adapter
//!
//! Translates compiled [`SearchRequest`]s into the engine's JSON query DSL
//! and parses hit, aggregation and bulk responses. Failures of the transport
//! (connection refused, timeout) and error statuses are converted into
//! [`SearchError`] values; nothing is retried here.

use crate::config::EngineConfig;
use crate::engine::{BulkIndexReport, BulkItemError, EngineBucket, EngineHit, EngineSearchResponse, SearchEngine};
use crate::models::{fields, Product};
use crate::search::{Aggregation, BoolClause, Clause, SearchError, SearchRequest, SearchResult, SortClause, SortOrder};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;

/// Optimistic-concurrency retries for the id sequence document
const SEQUENCE_RETRY_ON_CONFLICT: u32 = 10;

/// Assigns each supplied top-level field; a plain `{"doc": ..}` update would
/// deep-merge object fields
const REPLACE_FIELDS_SCRIPT: &str =
    "for (entry in params.doc.entrySet()) { ctx._source[entry.getKey()] = entry.getValue(); }";

/// REST client for an OpenSearch-compatible engine
#[derive(Clone)]
pub struct OpenSearchEngine {
    client: Client,
    base_url: String,
    index: String,
    sequence_index: String,
    refresh_on_write: bool,
    credentials: Option<(String, Option<String>)>,
}

impl OpenSearchEngine {
    /// Create a new adapter from engine configuration
    pub fn new(config: &EngineConfig) -> SearchResult<Self> {
        if config.url.trim().is_empty() {
            return Err(SearchError::InvalidConfiguration(
                "engine.url must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SearchError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e)))?;

        let credentials = config
            .username_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
            .map(|username| {
                let password = config
                    .password_env
                    .as_ref()
                    .and_then(|var| std::env::var(var).ok());
                (username, password)
            });

        tracing::info!(
            url = %config.url,
            index = %config.index,
            authenticated = credentials.is_some(),
            "Initialized OpenSearch engine adapter"
        );

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            index: config.index.clone(),
            sequence_index: config.sequence_index.clone(),
            refresh_on_write: config.refresh_on_write,
            credentials,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.base_url, path.trim_start_matches('/')));
        match &self.credentials {
            Some((username, password)) => builder.basic_auth(username, password.as_ref()),
            None => builder,
        }
    }

    fn refresh(&self) -> &'static str {
        if self.refresh_on_write {
            "true"
        } else {
            "false"
        }
    }

    fn doc_path(&self, id: u64) -> String {
        format!("{}/_doc/{}?refresh={}", self.index, id, self.refresh())
    }
}

#[async_trait]
impl SearchEngine for OpenSearchEngine {
    fn name(&self) -> &'static str {
        "open_search"
    }

    async fn ensure_index(&self) -> SearchResult<()> {
        let response = self.request(Method::HEAD, &self.index).send().await?;
        if response.status().is_success() {
            tracing::debug!(index = %self.index, "Index already exists");
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            return Err(error_from_response(response).await);
        }

        let response = self
            .request(Method::PUT, &self.index)
            .json(&index_mappings())
            .send()
            .await?;
        check(response).await?;
        tracing::info!(index = %self.index, "Created index with product mappings");
        Ok(())
    }

    async fn next_id(&self) -> SearchResult<u64> {
        let path = format!(
            "{}/_update/{}?refresh={}&retry_on_conflict={}",
            self.sequence_index,
            self.index,
            self.refresh(),
            SEQUENCE_RETRY_ON_CONFLICT
        );
        let body = json!({
            "script": { "source": "ctx._source.value += 1", "lang": "painless" },
            "upsert": { "value": 1 },
            "_source": true
        });

        let response = check(self.request(Method::POST, &path).json(&body).send().await?).await?;
        let value: Value = response.json().await?;
        value
            .pointer("/get/_source/value")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchError::MalformedResponse("sequence update did not return a value".to_string()))
    }

    async fn index_document(&self, product: &Product) -> SearchResult<u64> {
        let response = self
            .request(Method::PUT, &self.doc_path(product.id))
            .json(product)
            .send()
            .await?;
        check(response).await?;
        tracing::debug!(product_id = product.id, "Document indexed");
        Ok(product.id)
    }

    async fn bulk_index(&self, products: &[Product]) -> SearchResult<BulkIndexReport> {
        if products.is_empty() {
            return Ok(BulkIndexReport::from_errors(0, Vec::new()));
        }

        let body = bulk_body(&self.index, products)?;
        let response = self
            .request(Method::POST, &format!("_bulk?refresh={}", self.refresh()))
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        let raw: RawBulkResponse = check(response).await?.json().await?;

        let report = bulk_report(products, raw);
        if !report.success {
            tracing::warn!(
                failed = report.errors.len(),
                indexed = report.indexed,
                "Bulk index completed with item failures"
            );
        }
        Ok(report)
    }

    async fn get_document(&self, id: u64) -> SearchResult<Option<Product>> {
        let response = self
            .request(Method::GET, &format!("{}/_doc/{}", self.index, id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: RawGetResponse = check(response).await?.json().await?;
        Ok(if raw.found { raw.source } else { None })
    }

    async fn update_document(&self, id: u64, partial: &Value) -> SearchResult<bool> {
        let path = format!("{}/_update/{}?refresh={}", self.index, id, self.refresh());
        let response = self
            .request(Method::POST, &path)
            .json(&partial_update_body(partial))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response).await?;
        Ok(true)
    }

    async fn delete_document(&self, id: u64) -> SearchResult<bool> {
        let response = self.request(Method::DELETE, &self.doc_path(id)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response).await?;
        Ok(true)
    }

    async fn search(&self, request: &SearchRequest) -> SearchResult<EngineSearchResponse> {
        let body = request_to_json(request);
        tracing::debug!(index = %self.index, query = %body, "Executing search");

        let response = self
            .request(Method::POST, &format!("{}/_search", self.index))
            .json(&body)
            .send()
            .await?;
        let raw: RawSearchResponse = check(response).await?.json().await?;
        Ok(raw.into_engine_response())
    }

    async fn health_check(&self) -> bool {
        let response = match self.request(Method::GET, "_cluster/health").send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Engine health check failed");
                return false;
            }
        };
        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Engine health check returned error status");
            return false;
        }
        match response.json::<Value>().await {
            Ok(body) => body.get("status").and_then(Value::as_str) != Some("red"),
            Err(e) => {
                tracing::warn!(error = %e, "Engine health response unreadable");
                false
            }
        }
    }
}

/// Pass successful responses through, convert everything else into an error
async fn check(response: Response) -> SearchResult<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(response).await)
    }
}

async fn error_from_response(response: Response) -> SearchError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let reason = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/root_cause/0/reason")
                .or_else(|| v.pointer("/error/reason"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body);

    tracing::error!(status = status.as_u16(), reason = %reason, "Engine request failed");

    match status {
        StatusCode::BAD_REQUEST => SearchError::InvalidQuery(reason),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => SearchError::Timeout(reason),
        StatusCode::SERVICE_UNAVAILABLE => SearchError::EngineUnavailable(reason),
        _ => SearchError::EngineFailure(format!("{}: {}", status, reason)),
    }
}

fn partial_update_body(partial: &Value) -> Value {
    json!({
        "script": {
            "source": REPLACE_FIELDS_SCRIPT,
            "lang": "painless",
            "params": { "doc": partial }
        }
    })
}

fn index_mappings() -> Value {
    json!({
        "mappings": {
            "properties": {
                fields::ID: { "type": "long" },
                fields::TITLE: { "type": "text", "fields": { "keyword": { "type": "keyword" } } },
                fields::DESCRIPTION: { "type": "text" },
                fields::CATEGORY: { "type": "keyword" },
                fields::BRAND: { "type": "keyword" },
                fields::PRICE: { "type": "double" },
                fields::ATTRIBUTES: { "type": "object" },
                fields::CREATED_AT: { "type": "date" },
                fields::IS_ACTIVE: { "type": "boolean" }
            }
        }
    })
}

fn bulk_body(index: &str, products: &[Product]) -> SearchResult<String> {
    let mut body = String::new();
    for product in products {
        body.push_str(&serde_json::to_string(&json!({
            "index": { "_index": index, "_id": product.document_id() }
        }))?);
        body.push('\n');
        body.push_str(&serde_json::to_string(product)?);
        body.push('\n');
    }
    Ok(body)
}

/// Build the item-by-item report. Items without a reported result count as failed.
fn bulk_report(products: &[Product], raw: RawBulkResponse) -> BulkIndexReport {
    let errors = products
        .iter()
        .enumerate()
        .filter_map(|(index, product)| {
            let reason = match raw.items.get(index).and_then(|item| item.index.as_ref()) {
                None => Some("no result reported for item".to_string()),
                Some(result) if result.error.is_some() || !(200..300).contains(&result.status) => {
                    Some(
                        result
                            .error
                            .as_ref()
                            .and_then(|e| e.get("reason").and_then(Value::as_str).map(str::to_string))
                            .unwrap_or_else(|| format!("status {}", result.status)),
                    )
                }
                Some(_) => None,
            };
            reason.map(|reason| BulkItemError {
                index,
                id: Some(product.id),
                reason,
            })
        })
        .collect();
    BulkIndexReport::from_errors(products.len(), errors)
}

/// Translate a compiled request into the engine's JSON query DSL
pub fn request_to_json(request: &SearchRequest) -> Value {
    let mut body = json!({
        "query": clause_to_json(&request.query),
        "sort": request.sort.iter().map(sort_to_json).collect::<Vec<_>>(),
        "from": request.from,
        "size": request.size,
        "track_total_hits": true,
    });
    // Field-sorted hits carry no score unless asked for
    if !matches!(request.sort.first(), None | Some(SortClause::Score)) {
        body["track_scores"] = json!(true);
    }
    if !request.aggregations.is_empty() {
        let aggs: Map<String, Value> = request
            .aggregations
            .iter()
            .map(|a| (a.name().to_string(), aggregation_to_json(a)))
            .collect();
        body["aggs"] = Value::Object(aggs);
    }
    body
}

fn clause_to_json(clause: &Clause) -> Value {
    match clause {
        Clause::MatchAll => json!({ "match_all": {} }),
        Clause::MultiMatch { query, fields, fuzzy } => {
            let mut multi_match = json!({
                "query": query,
                "fields": fields
                    .iter()
                    .map(|f| format!("{}^{}", f.field, f.boost))
                    .collect::<Vec<_>>(),
                "type": "best_fields",
            });
            if *fuzzy {
                multi_match["fuzziness"] = json!("AUTO");
            }
            json!({ "multi_match": multi_match })
        }
        Clause::Term { field, value } => json!({ "term": { field: value } }),
        Clause::Range { field, gte, lte } => {
            let mut bounds = Map::new();
            if let Some(gte) = gte {
                bounds.insert("gte".to_string(), json!(gte));
            }
            if let Some(lte) = lte {
                bounds.insert("lte".to_string(), json!(lte));
            }
            json!({ "range": { field: bounds } })
        }
        Clause::Prefix { field, value, boost } => json!({
            "prefix": { field: { "value": value, "boost": boost, "case_insensitive": true } }
        }),
        Clause::Bool(b) => json!({ "bool": bool_to_json(b) }),
    }
}

fn bool_to_json(clause: &BoolClause) -> Value {
    let mut body = Map::new();
    for (name, clauses) in [
        ("must", &clause.must),
        ("filter", &clause.filter),
        ("should", &clause.should),
    ] {
        if !clauses.is_empty() {
            body.insert(
                name.to_string(),
                Value::Array(clauses.iter().map(clause_to_json).collect()),
            );
        }
    }
    if let Some(minimum) = clause.minimum_should_match {
        body.insert("minimum_should_match".to_string(), json!(minimum));
    }
    Value::Object(body)
}

fn sort_to_json(sort: &SortClause) -> Value {
    match sort {
        SortClause::Score => json!({ "_score": { "order": "desc" } }),
        SortClause::Field { field, order } => {
            let order = match order {
                SortOrder::Ascending => "asc",
                SortOrder::Descending => "desc",
            };
            json!({ field: { "order": order } })
        }
    }
}

fn aggregation_to_json(aggregation: &Aggregation) -> Value {
    match aggregation {
        Aggregation::Terms { field, size, .. } => json!({
            "terms": { "field": field, "size": size, "order": { "_count": "desc" } }
        }),
        Aggregation::Range { field, ranges, .. } => {
            let ranges: Vec<Value> = ranges
                .iter()
                .map(|range| {
                    let mut bucket = Map::new();
                    bucket.insert("key".to_string(), json!(range.key));
                    if let Some(from) = range.from {
                        bucket.insert("from".to_string(), json!(from));
                    }
                    if let Some(to) = range.to {
                        bucket.insert("to".to_string(), json!(to));
                    }
                    Value::Object(bucket)
                })
                .collect();
            json!({ "range": { "field": field, "ranges": ranges } })
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSearchResponse {
    hits: RawHits,
    #[serde(default)]
    aggregations: HashMap<String, RawAggregation>,
}

#[derive(Debug, Deserialize)]
struct RawHits {
    total: RawTotal,
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// Older engines report a bare number, newer ones an object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTotal {
    Count(u64),
    Object { value: u64 },
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source")]
    source: Product,
}

#[derive(Debug, Deserialize)]
struct RawAggregation {
    #[serde(default)]
    buckets: Vec<RawBucket>,
}

#[derive(Debug, Deserialize)]
struct RawBucket {
    key: Value,
    doc_count: u64,
    #[serde(default)]
    from: Option<f64>,
    #[serde(default)]
    to: Option<f64>,
}

impl RawSearchResponse {
    fn into_engine_response(self) -> EngineSearchResponse {
        let total = match self.hits.total {
            RawTotal::Count(count) => count,
            RawTotal::Object { value } => value,
        };

        let (hits, documents): (Vec<EngineHit>, Vec<Product>) = self
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                (
                    EngineHit {
                        id: hit.id,
                        score: hit.score,
                    },
                    hit.source,
                )
            })
            .unzip();

        let aggregations = self
            .aggregations
            .into_iter()
            .map(|(name, aggregation)| {
                let buckets = aggregation
                    .buckets
                    .into_iter()
                    .map(|bucket| EngineBucket {
                        key: match bucket.key {
                            Value::String(key) => key,
                            other => other.to_string(),
                        },
                        doc_count: bucket.doc_count,
                        from: bucket.from,
                        to: bucket.to,
                    })
                    .collect();
                (name, buckets)
            })
            .collect();

        EngineSearchResponse {
            total,
            hits,
            documents,
            aggregations,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawGetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source", default)]
    source: Option<Product>,
}

#[derive(Debug, Deserialize)]
struct RawBulkResponse {
    #[serde(default)]
    items: Vec<RawBulkItem>,
}

#[derive(Debug, Deserialize)]
struct RawBulkItem {
    #[serde(default)]
    index: Option<RawBulkResult>,
}

#[derive(Debug, Deserialize)]
struct RawBulkResult {
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

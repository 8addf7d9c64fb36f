use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use validator::Validate;

/// Document field names as stored in the search engine
pub mod fields {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const CATEGORY: &str = "category";
    pub const BRAND: &str = "brand";
    pub const PRICE: &str = "price";
    pub const ATTRIBUTES: &str = "attributes";
    pub const CREATED_AT: &str = "createdAt";
    pub const IS_ACTIVE: &str = "isActive";
}

/// A catalog entry. The search engine owns the authoritative copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Engine-allocated identifier
    pub id: u64,

    #[validate(length(min = 1, max = 500))]
    pub title: String,

    pub description: String,

    #[validate(length(min = 1, max = 200))]
    pub category: String,

    #[validate(length(min = 1, max = 200))]
    pub brand: String,

    #[validate(range(min = 0.0))]
    pub price: f64,

    /// Free-form key/value attributes (color, size, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<HashMap<String, String>>,

    /// Set once at creation
    pub created_at: DateTime<Utc>,

    /// Soft-delete flag
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Product {
    /// Engine document id for this product
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}

/// Request to create a new product
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 10000))]
    pub description: String,

    #[validate(length(min = 1, max = 200))]
    pub category: String,

    #[validate(length(min = 1, max = 200))]
    pub brand: String,

    #[validate(range(min = 0.0))]
    pub price: f64,

    #[serde(default)]
    pub attributes: Option<HashMap<String, String>>,
}

impl CreateProductRequest {
    /// Build the product that will be written for `id`
    pub fn into_product(self, id: u64, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            title: self.title,
            description: self.description,
            category: self.category,
            brand: self.brand,
            price: self.price,
            attributes: self.attributes,
            created_at,
            is_active: true,
        }
    }
}

/// Partial update; only supplied fields change
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,

    #[validate(length(max = 10000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub category: Option<String>,

    #[validate(length(min = 1, max = 200))]
    pub brand: Option<String>,

    #[validate(range(min = 0.0))]
    pub price: Option<f64>,

    pub attributes: Option<HashMap<String, String>>,
}

impl UpdateProductRequest {
    /// Check if any field is set
    pub fn has_updates(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.category.is_some()
            || self.brand.is_some()
            || self.price.is_some()
            || self.attributes.is_some()
    }

    /// Merge the supplied fields into `product`
    pub fn apply(&self, product: &mut Product) {
        if let Some(ref title) = self.title {
            product.title = title.clone();
        }
        if let Some(ref description) = self.description {
            product.description = description.clone();
        }
        if let Some(ref category) = self.category {
            product.category = category.clone();
        }
        if let Some(ref brand) = self.brand {
            product.brand = brand.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(ref attributes) = self.attributes {
            product.attributes = Some(attributes.clone());
        }
    }

    /// Partial document containing only the supplied fields, keyed by engine field name
    pub fn to_partial_document(&self) -> Value {
        let mut doc = Map::new();
        if let Some(ref title) = self.title {
            doc.insert(fields::TITLE.to_string(), Value::from(title.clone()));
        }
        if let Some(ref description) = self.description {
            doc.insert(fields::DESCRIPTION.to_string(), Value::from(description.clone()));
        }
        if let Some(ref category) = self.category {
            doc.insert(fields::CATEGORY.to_string(), Value::from(category.clone()));
        }
        if let Some(ref brand) = self.brand {
            doc.insert(fields::BRAND.to_string(), Value::from(brand.clone()));
        }
        if let Some(price) = self.price {
            doc.insert(fields::PRICE.to_string(), Value::from(price));
        }
        if let Some(ref attributes) = self.attributes {
            let attrs: Map<String, Value> = attributes
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                .collect();
            doc.insert(fields::ATTRIBUTES.to_string(), Value::Object(attrs));
        }
        Value::Object(doc)
    }
}

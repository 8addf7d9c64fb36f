//! Product catalog search service
//!
//! Catalog entries live in an external search engine. This crate builds
//! engine-neutral queries from request parameters, executes them through a
//! pluggable [`engine::SearchEngine`] port and shapes the responses into
//! paged results, facet buckets and autocomplete suggestions.

pub mod api;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod search;

pub use error::{AppError, Result};

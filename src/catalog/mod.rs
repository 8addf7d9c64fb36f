//! Catalog lifecycle and search orchestration
//!
//! [`CatalogService`] sits on top of the [`crate::engine::SearchEngine`] port:
//! it allocates ids, applies partial updates and soft deletes, validates
//! search requests and runs them through the query compiler and shapers.

mod service;

pub use service::CatalogService;

//! Search engine backend
//!
//! `SearchBackend` is the only seam through which the crate talks to the engine.
//! `ElasticClient` implements it over the Elasticsearch REST API; tests use an
//! in-memory fake.

pub mod elastic;
pub mod response;

use crate::error::SearchError;
use async_trait::async_trait;
use serde_json::Value;

pub use elastic::ElasticClient;
pub use response::{BulkItem, BulkResponse, CreateOutcome, Hit, SearchResponse, TotalHits, TotalRelation};

/// Primitive engine operations
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Disabled backends fail every call with `EngineDisabled`
    fn is_enabled(&self) -> bool;

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;

    /// Create an index with settings and mappings
    async fn create_index(&self, index: &str, body: &Value) -> Result<CreateOutcome, SearchError>;

    /// Delete an index; `Ok(false)` when it did not exist
    async fn delete_index(&self, index: &str) -> Result<bool, SearchError>;

    /// Current definition of an ingest pipeline, if any
    async fn get_pipeline(&self, name: &str) -> Result<Option<Value>, SearchError>;

    async fn put_pipeline(&self, name: &str, body: &Value) -> Result<(), SearchError>;

    async fn search(&self, index: &str, body: &Value) -> Result<SearchResponse, SearchError>;

    async fn index_document(&self, index: &str, id: &str, document: &Value) -> Result<(), SearchError>;

    /// Partial update of an existing document
    async fn update_document(&self, index: &str, id: &str, document: &Value) -> Result<(), SearchError>;

    /// Delete a document; a missing document is not an error
    async fn delete_document(&self, index: &str, id: &str) -> Result<(), SearchError>;

    /// Submit a newline-delimited bulk body
    async fn bulk(&self, body: String) -> Result<BulkResponse, SearchError>;

    /// Raw `_ml/trained_models/<id>/_stats` answer
    async fn trained_model_stats(&self, model_id: &str) -> Result<Value, SearchError>;
}

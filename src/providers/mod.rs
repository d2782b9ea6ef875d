//! Query expansion capabilities
//!
//! Linguistic and semantic expansion are optional; the engine runs with
//! neither, either or both providers configured.

pub mod semantic;
pub mod synonyms;

use crate::error::SearchError;
use crate::search::dsl::Query;
use async_trait::async_trait;

pub use semantic::ElserSemanticProvider;
pub use synonyms::ThesaurusSynonymProvider;

/// Source of synonyms for query words
#[async_trait]
pub trait SynonymProvider: Send + Sync {
    /// Synonyms for all `words` together, without the words themselves
    async fn get_all_synonyms(&self, words: &[String], language: &str) -> Result<Vec<String>, SearchError>;
}

/// Semantic (model-backed) expansion
#[async_trait]
pub trait SemanticProvider: Send + Sync {
    /// Model that populates `<field>.semantic` at ingest and expands queries
    fn model_id(&self) -> &str;

    /// Whether the model is deployed and able to serve inference
    async fn is_model_deployed(&self) -> Result<bool, SearchError>;

    /// Clause matching `text` against the semantic companion of `field`
    fn create_semantic_clause(&self, text: &str, field: &str, boost: f64) -> Query;
}

/// Companion field written by the ingest pipeline
pub fn semantic_field(field: &str) -> String {
    format!("{}.semantic", field)
}

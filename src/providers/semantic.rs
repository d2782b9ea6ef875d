//! ELSER sparse-vector expansion

use super::{semantic_field, SemanticProvider};
use crate::backend::SearchBackend;
use crate::error::SearchError;
use crate::search::dsl::Query;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct ElserSemanticProvider {
    backend: Arc<dyn SearchBackend>,
    model_id: String,
}

impl ElserSemanticProvider {
    pub fn new(backend: Arc<dyn SearchBackend>, model_id: impl Into<String>) -> Self {
        Self {
            backend,
            model_id: model_id.into(),
        }
    }
}

/// True when any deployment of the model reports state `started`
pub fn deployment_started(stats: &Value) -> bool {
    stats["trained_model_stats"]
        .as_array()
        .map(|models| {
            models
                .iter()
                .any(|m| m["deployment_stats"]["state"].as_str() == Some("started"))
        })
        .unwrap_or(false)
}

#[async_trait]
impl SemanticProvider for ElserSemanticProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn is_model_deployed(&self) -> Result<bool, SearchError> {
        let stats = self.backend.trained_model_stats(&self.model_id).await?;
        let started = deployment_started(&stats);
        debug!("Model {} deployed: {}", self.model_id, started);
        Ok(started)
    }

    fn create_semantic_clause(&self, text: &str, field: &str, boost: f64) -> Query {
        Query::TextExpansion {
            field: semantic_field(field),
            model_id: self.model_id.clone(),
            text: text.to_string(),
            boost,
        }
    }
}

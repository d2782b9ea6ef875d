//! Engine response shapes

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Body of a `_search` response; only the parts we read
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: HitsEnvelope,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HitsEnvelope {
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// Total hit count. `gte` means the engine stopped counting and `value` is a lower bound.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct TotalHits {
    pub value: u64,
    pub relation: TotalRelation,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TotalRelation {
    Eq,
    Gte,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Hit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Value,
}

impl SearchResponse {
    pub fn total(&self) -> u64 {
        self.hits
            .total
            .map(|t| t.value)
            .unwrap_or(self.hits.hits.len() as u64)
    }

    /// False when the engine reported a lower bound instead of an exact count
    pub fn total_is_exact(&self) -> bool {
        self.hits
            .total
            .map(|t| t.relation == TotalRelation::Eq)
            .unwrap_or(true)
    }
}

/// Body of a `_bulk` response
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    /// One single-key map per action: `{"index": {...}}`, `{"delete": {...}}`, ...
    #[serde(default)]
    pub items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BulkItem {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub error: Option<Value>,
}

impl BulkItem {
    /// Deleting a missing document is not a failure
    pub fn is_failure(&self, action: &str) -> bool {
        if action == "delete" && self.status == 404 {
            return false;
        }
        self.error.is_some() || self.status >= 300
    }
}

impl BulkResponse {
    /// (action, item) pairs that failed
    pub fn failures(&self) -> Vec<(&str, &BulkItem)> {
        self.items
            .iter()
            .flat_map(|entry| entry.iter())
            .filter(|(action, item)| item.is_failure(action))
            .map(|(action, item)| (action.as_str(), item))
            .collect()
    }
}

/// Outcome of an index creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Someone else created it first; treated as success
    AlreadyExists,
}

/// Error envelope returned with non-2xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorCause,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorCause {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ErrorEnvelope {
    /// Parse the engine error from a response body, if it has the usual shape
    pub fn parse(body: &str) -> Option<ErrorCause> {
        serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error)
    }
}

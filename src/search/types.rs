//! Search results and documents

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Soft degradations that did not fail the search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchWarnings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_search_unavailable: Option<bool>,
}

impl SearchWarnings {
    pub fn is_empty(&self) -> bool {
        self.semantic_search_unavailable.is_none()
    }
}

/// One page of search hits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult<D> {
    pub hits: Vec<D>,
    /// Exact count, or a lower bound when `total_is_exact` is false
    pub total: u64,
    pub total_is_exact: bool,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<SearchWarnings>,
}

impl<D> SearchResult<D> {
    pub fn semantic_unavailable(&self) -> bool {
        self.warnings
            .as_ref()
            .and_then(|w| w.semantic_search_unavailable)
            .unwrap_or(false)
    }
}

/// `ceil(total / limit)`; zero when there are no hits
pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}

/// Schema-less document: the engine id plus whatever the source held
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SearchDocument {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Source body sent to the engine (the id travels in the URL)
    pub fn source(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

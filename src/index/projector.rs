//! Projection of domain entities into search documents

use super::mapping::GENERIC_FIELDS;
use crate::error::SearchError;
use crate::search::types::SearchDocument;
use serde_json::Value;

/// Compiled-in projection for one entity type
pub trait Projector {
    type Entity;

    const INDEX_NAME: &'static str;
    /// Ordered by importance; the first field gets the highest boost
    const SEARCH_FIELDS: &'static [&'static str];

    fn project(&self, entity: &Self::Entity) -> SearchDocument;
}

/// Projects arbitrary JSON entities, keeping the search fields and the generic fields
#[derive(Debug, Clone)]
pub struct JsonProjector {
    index: String,
    search_fields: Vec<String>,
}

impl JsonProjector {
    pub fn new(index: impl Into<String>, search_fields: Vec<String>) -> Self {
        Self {
            index: index.into(),
            search_fields,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Project one entity; it must carry a string or numeric `id` (or `_id`)
    pub fn project(&self, entity: &Value) -> Result<SearchDocument, SearchError> {
        let object = entity
            .as_object()
            .ok_or_else(|| SearchError::InvalidInput("Entity must be a JSON object".to_string()))?;

        let id = object
            .get("id")
            .or_else(|| object.get("_id"))
            .and_then(|v| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| {
                SearchError::InvalidInput(format!("Entity for index '{}' has no id", self.index))
            })?;

        let mut document = SearchDocument::new(id);
        let keep = self
            .search_fields
            .iter()
            .map(String::as_str)
            .chain(GENERIC_FIELDS.iter().map(|(name, _)| *name));
        for key in keep {
            if let Some(value) = object.get(key) {
                if !value.is_null() {
                    document.fields.insert(key.to_string(), value.clone());
                }
            }
        }
        Ok(document)
    }
}

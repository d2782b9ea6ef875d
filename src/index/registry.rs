//! Index registrations: which indexes exist and which fields they search
//!
//! Built once at startup through `IndexRegistryBuilder`, read-only afterwards.

use super::projector::Projector;
use crate::error::{validate_index_name, SearchError};
use std::collections::BTreeMap;

/// An index and its ordered search fields (earlier fields rank higher)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRegistration {
    pub name: String,
    pub search_fields: Vec<String>,
}

#[derive(Debug, Default)]
pub struct IndexRegistryBuilder {
    entries: BTreeMap<String, IndexRegistration>,
}

impl IndexRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an index. Registering the same index twice is accepted only
    /// with identical fields.
    pub fn register<S: AsRef<str>>(mut self, name: &str, fields: &[S]) -> Result<Self, SearchError> {
        validate_index_name(name)?;

        let mut search_fields: Vec<String> = Vec::with_capacity(fields.len());
        for field in fields {
            let field = field.as_ref().trim();
            if field.is_empty() {
                return Err(SearchError::InvalidInput(format!(
                    "Index '{}' has an empty search field name",
                    name
                )));
            }
            if !search_fields.iter().any(|f| f == field) {
                search_fields.push(field.to_string());
            }
        }
        if search_fields.is_empty() {
            return Err(SearchError::InvalidInput(format!(
                "Index '{}' needs at least one search field",
                name
            )));
        }

        if let Some(existing) = self.entries.get(name) {
            if existing.search_fields != search_fields {
                return Err(SearchError::InvalidInput(format!(
                    "Index '{}' is already registered with fields {:?}",
                    name, existing.search_fields
                )));
            }
            return Ok(self);
        }

        self.entries.insert(
            name.to_string(),
            IndexRegistration {
                name: name.to_string(),
                search_fields,
            },
        );
        Ok(self)
    }

    /// Register the index a compiled-in projector writes to
    pub fn register_projector<P: Projector>(self) -> Result<Self, SearchError> {
        self.register(P::INDEX_NAME, P::SEARCH_FIELDS)
    }

    pub fn build(self) -> IndexRegistry {
        IndexRegistry {
            entries: self.entries,
        }
    }
}

/// Immutable registration table
#[derive(Debug, Default, Clone)]
pub struct IndexRegistry {
    entries: BTreeMap<String, IndexRegistration>,
}

impl IndexRegistry {
    pub fn builder() -> IndexRegistryBuilder {
        IndexRegistryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&IndexRegistration> {
        self.entries.get(name)
    }

    /// Search fields of a registered index
    pub fn fields(&self, name: &str) -> Result<&[String], SearchError> {
        self.get(name)
            .map(|r| r.search_fields.as_slice())
            .ok_or_else(|| SearchError::InvalidInput(format!("Index '{}' is not registered", name)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexRegistration> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Filter and exclusion clauses

use super::dsl::Query;
use super::options::{FilterValue, SearchOptions};

/// `term`/`terms` clauses for every non-null filter, in key order
pub fn filter_clauses(options: &SearchOptions) -> Vec<Query> {
    options
        .filters
        .iter()
        .filter_map(|(field, value)| {
            let value = value.as_ref()?;
            Some(match value {
                FilterValue::One(scalar) => Query::Term {
                    field: field.clone(),
                    value: scalar.clone(),
                },
                FilterValue::Many(values) => Query::Terms {
                    field: field.clone(),
                    values: values.clone(),
                },
            })
        })
        .collect()
}

/// `must_not` clauses removing documents the caller already has
pub fn exclusion_clauses(options: &SearchOptions) -> Vec<Query> {
    let ids: Vec<String> = options
        .exclude_ids
        .iter()
        .filter(|id| !id.trim().is_empty())
        .cloned()
        .collect();
    if ids.is_empty() {
        Vec::new()
    } else {
        vec![Query::ids_excluded(&ids)]
    }
}

//! Semantic ingest pipeline definition

use crate::providers::semantic_field;
use serde_json::{json, Value};

/// Pipeline name for one index; each index has its own search fields
pub fn pipeline_name(base: &str, index: &str) -> String {
    format!("{}-{}", base, index)
}

/// One inference processor per search field, writing `<field>.semantic`
pub fn pipeline_body(search_fields: &[String], model_id: &str) -> Value {
    let processors: Vec<Value> = search_fields
        .iter()
        .map(|field| {
            json!({
                "inference": {
                    "model_id": model_id,
                    "input_output": [{
                        "input_field": field,
                        "output_field": semantic_field(field)
                    }],
                    "ignore_missing": true
                }
            })
        })
        .collect();

    json!({
        "description": format!("Semantic enrichment with {}", model_id),
        "processors": processors
    })
}

/// An existing pipeline is kept only when its processors are what we would write
pub fn pipeline_matches(existing: &Value, desired: &Value) -> bool {
    existing.get("processors") == desired.get("processors")
}

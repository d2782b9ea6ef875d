//! Generated index settings and mappings

use serde_json::{json, Map, Value};

/// Fields every document index carries besides its search fields
pub const GENERIC_FIELDS: &[(&str, GenericFieldType)] = &[
    ("tags", GenericFieldType::Keyword),
    ("category", GenericFieldType::Keyword),
    ("authorId", GenericFieldType::Keyword),
    ("questionId", GenericFieldType::Keyword),
    ("parentId", GenericFieldType::Keyword),
    ("createdAt", GenericFieldType::Date),
    ("updatedAt", GenericFieldType::Date),
    ("likeCount", GenericFieldType::Integer),
    ("viewCount", GenericFieldType::Integer),
    ("answerCount", GenericFieldType::Integer),
];

pub const NGRAM_ANALYZER: &str = "ngram_analyzer";
const NGRAM_TOKENIZER: &str = "ngram_tokenizer";
const NGRAM_MIN: u32 = 3;
const NGRAM_MAX: u32 = 4;
const KEYWORD_IGNORE_ABOVE: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericFieldType {
    Keyword,
    Date,
    Integer,
}

impl GenericFieldType {
    fn as_str(self) -> &'static str {
        match self {
            GenericFieldType::Keyword => "keyword",
            GenericFieldType::Date => "date",
            GenericFieldType::Integer => "integer",
        }
    }
}

/// Built-in analyzer for a language code, `standard` when unknown
pub fn language_analyzer(language: &str) -> &'static str {
    match language.to_ascii_lowercase().as_str() {
        "en" => "english",
        "fr" => "french",
        "de" => "german",
        "es" => "spanish",
        "it" => "italian",
        "pt" => "portuguese",
        "nl" => "dutch",
        "ru" => "russian",
        _ => "standard",
    }
}

/// Mapping for one search field: analyzed text plus keyword and ngram sub-fields.
/// The `<field>.semantic` companion is left to dynamic mapping.
fn search_field_mapping(analyzer: &str) -> Value {
    json!({
        "type": "text",
        "analyzer": analyzer,
        "fields": {
            "keyword": { "type": "keyword", "ignore_above": KEYWORD_IGNORE_ABOVE },
            "ngram": { "type": "text", "analyzer": NGRAM_ANALYZER }
        }
    })
}

/// Full `PUT <index>` body
pub fn index_body(search_fields: &[String], language: &str, default_pipeline: Option<&str>) -> Value {
    let analyzer = language_analyzer(language);

    let mut properties = Map::new();
    for (name, kind) in GENERIC_FIELDS {
        properties.insert(name.to_string(), json!({ "type": kind.as_str() }));
    }
    // search fields win if they share a name with a generic field
    for field in search_fields {
        properties.insert(field.clone(), search_field_mapping(analyzer));
    }

    let mut index_settings = json!({
        "max_ngram_diff": NGRAM_MAX - NGRAM_MIN,
    });
    if let Some(pipeline) = default_pipeline {
        index_settings["default_pipeline"] = Value::String(pipeline.to_string());
    }

    json!({
        "settings": {
            "index": index_settings,
            "analysis": {
                "tokenizer": {
                    NGRAM_TOKENIZER: {
                        "type": "ngram",
                        "min_gram": NGRAM_MIN,
                        "max_gram": NGRAM_MAX,
                        "token_chars": ["letter", "digit"]
                    }
                },
                "analyzer": {
                    NGRAM_ANALYZER: {
                        "type": "custom",
                        "tokenizer": NGRAM_TOKENIZER,
                        "filter": ["lowercase"]
                    }
                }
            }
        },
        "mappings": {
            "properties": properties
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<String> {
        vec!["title".to_string(), "body".to_string()]
    }

    #[test]
    fn test_search_fields_are_analyzed_text() {
        let body = index_body(&fields(), "en", None);
        let title = &body["mappings"]["properties"]["title"];
        assert_eq!(title["type"], "text");
        assert_eq!(title["analyzer"], "english");
        assert_eq!(title["fields"]["keyword"]["type"], "keyword");
        assert_eq!(title["fields"]["ngram"]["analyzer"], NGRAM_ANALYZER);
    }

    #[test]
    fn test_generic_fields_present() {
        let body = index_body(&fields(), "en", None);
        let props = &body["mappings"]["properties"];
        assert_eq!(props["tags"]["type"], "keyword");
        assert_eq!(props["createdAt"]["type"], "date");
        assert_eq!(props["likeCount"]["type"], "integer");
        assert_eq!(props["answerCount"]["type"], "integer");
        assert_eq!(props.as_object().unwrap().len(), GENERIC_FIELDS.len() + 2);
    }

    #[test]
    fn test_semantic_companions_never_declared() {
        let body = index_body(&fields(), "en", Some("forum-semantic"));
        let props = body["mappings"]["properties"].as_object().unwrap();
        assert!(props.keys().all(|k| !k.ends_with(".semantic")));
        assert!(props["title"]["fields"].get("semantic").is_none());
        assert_eq!(body["settings"]["index"]["default_pipeline"], "forum-semantic");
    }

    #[test]
    fn test_no_default_pipeline_without_semantic() {
        let body = index_body(&fields(), "en", None);
        assert!(body["settings"]["index"].get("default_pipeline").is_none());
        assert_eq!(body["settings"]["index"]["max_ngram_diff"], 1);
    }

    #[test]
    fn test_language_analyzers() {
        assert_eq!(language_analyzer("FR"), "french");
        assert_eq!(language_analyzer("de"), "german");
        assert_eq!(language_analyzer("xx"), "standard");
        let body = index_body(&fields(), "ru", None);
        assert_eq!(body["mappings"]["properties"]["body"]["analyzer"], "russian");
    }
}

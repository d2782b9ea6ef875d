//! Error types for query construction, provisioning and engine I/O

use serde::Serialize;
use thiserror::Error;

/// Maximum accepted length of a raw query, in characters.
pub const MAX_QUERY_CHARS: usize = 200;

/// Errors surfaced by the search subsystem.
///
/// Soft degradations (synonym or semantic lookups failing) never show up here;
/// they are logged and reported through `SearchWarnings` instead.
#[derive(Debug, Error, Serialize)]
pub enum SearchError {
    #[error("Query too long: {length} characters, maximum {max}")]
    QueryTooLong { length: usize, max: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Search engine is disabled")]
    EngineDisabled,

    #[error("Search engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Malformed engine response: {0}")]
    MalformedResponse(String),

    #[error("Index provisioning failed for '{index}': {reason}")]
    Provisioning { index: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl SearchError {
    /// Stable machine-readable code for callers that render errors
    pub fn error_code(&self) -> &'static str {
        match self {
            SearchError::QueryTooLong { .. } => "query_too_long",
            SearchError::InvalidInput(_) => "invalid_input",
            SearchError::EngineDisabled => "engine_disabled",
            SearchError::EngineUnavailable(_) => "engine_unavailable",
            SearchError::MalformedResponse(_) => "malformed_response",
            SearchError::Provisioning { .. } => "provisioning_failed",
            SearchError::Config(_) => "config_error",
            SearchError::Provider(_) => "provider_error",
            SearchError::Io(_) => "io_error",
        }
    }

    /// Input errors are the caller's fault and must not be retried
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SearchError::QueryTooLong { .. } | SearchError::InvalidInput(_)
        )
    }

    /// Transport-level failures: the engine could not be reached or answered garbage
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            SearchError::EngineUnavailable(_) | SearchError::MalformedResponse(_)
        )
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::MalformedResponse(err.to_string())
        } else if err.is_builder() {
            SearchError::Config(err.to_string())
        } else {
            SearchError::EngineUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::MalformedResponse(err.to_string())
    }
}

impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        SearchError::Io(err.to_string())
    }
}

impl From<url::ParseError> for SearchError {
    fn from(err: url::ParseError) -> Self {
        SearchError::Config(format!("invalid engine URL: {}", err))
    }
}

/// Reject queries longer than [`MAX_QUERY_CHARS`]. Empty queries are valid (match-all).
pub fn validate_query(query: &str) -> Result<(), SearchError> {
    let length = query.chars().count();
    if length > MAX_QUERY_CHARS {
        return Err(SearchError::QueryTooLong {
            length,
            max: MAX_QUERY_CHARS,
        });
    }
    Ok(())
}

/// Validate an index name against the engine's naming rules
pub fn validate_index_name(name: &str) -> Result<(), SearchError> {
    if name.is_empty() {
        return Err(SearchError::InvalidInput("Index name cannot be empty".to_string()));
    }
    if name.starts_with(['-', '_', '+']) {
        return Err(SearchError::InvalidInput(format!(
            "Index name '{}' cannot start with '-', '_' or '+'",
            name
        )));
    }
    if name.chars().any(|c| {
        c.is_ascii_uppercase() || matches!(c, '\\' | '/' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' | ',' | '#' | ':')
    }) {
        return Err(SearchError::InvalidInput(format!(
            "Index name '{}' must be lowercase and free of reserved characters",
            name
        )));
    }
    Ok(())
}

/// Normalize query text using Unicode NFKC
pub fn normalize_text(text: &str) -> String {
    use unicode_normalization::UnicodeNormalization;
    text.nfkc().collect::<String>().trim().to_string()
}

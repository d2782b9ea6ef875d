//! Query Parser & Normalizer
//!
//! Tokenizes the raw query on whitespace, removes duplicate tokens, counts
//! unique words and settles the effective search mode.

use super::options::SearchMode;
use crate::error::{normalize_text, validate_query, SearchError};

/// Parsed and normalized search query
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    /// Original unmodified query
    pub original: String,
    /// Unique tokens in first-occurrence order (case preserved)
    pub words: Vec<String>,
    /// Mode after single-word normalization
    pub mode: SearchMode,
}

impl ParsedQuery {
    /// Empty input means "match everything"
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Unique words joined back into query text
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    /// Mean word length in characters, 0 for an empty query
    pub fn average_word_length(&self) -> f64 {
        if self.words.is_empty() {
            return 0.0;
        }
        let total: usize = self.words.iter().map(|w| w.chars().count()).sum();
        total as f64 / self.words.len() as f64
    }
}

/// Query parser and normalizer
pub struct QueryParser;

impl QueryParser {
    /// Parse a query, rejecting input over the length limit.
    ///
    /// The length check runs on the raw input, before Unicode normalization.
    pub fn parse(query: &str, requested_mode: SearchMode) -> Result<ParsedQuery, SearchError> {
        validate_query(query)?;

        let normalized = normalize_text(query);
        let words = Self::unique_tokens(&normalized);
        let mode = Self::effective_mode(words.len(), requested_mode);

        Ok(ParsedQuery {
            original: query.to_string(),
            words,
            mode,
        })
    }

    /// Split on whitespace and drop repeats, keeping first occurrences.
    /// Comparison is case-sensitive: "Rust" and "rust" are distinct tokens.
    fn unique_tokens(text: &str) -> Vec<String> {
        let mut words: Vec<String> = Vec::new();
        for token in text.split_whitespace() {
            if !words.iter().any(|w| w == token) {
                words.push(token.to_string());
            }
        }
        words
    }

    /// Phrase, all-words and any-word are indistinguishable for a single token
    pub fn effective_mode(unique_words: usize, requested: SearchMode) -> SearchMode {
        if unique_words == 1 {
            SearchMode::AnyWord
        } else {
            requested
        }
    }
}

//! Linguistic and semantic query expansion
//!
//! Both expanders are soft: a failing provider never fails the search. Linguistic
//! failures are only logged; semantic unavailability is reported back so the
//! caller can surface a warning.

use super::clauses::{tier_boost, ClauseBuilder, SEMANTIC_BOOST};
use super::dsl::Query;
use super::options::SearchOptions;
use super::parser::ParsedQuery;
use crate::providers::{SemanticProvider, SynonymProvider};
use tracing::{debug, warn};

/// Result of semantic expansion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemanticExpansion {
    pub clauses: Vec<Query>,
    /// Expansion was requested but could not be applied
    pub unavailable: bool,
}

/// Synonym clauses for the query, shaped like the primary clauses
pub async fn expand_linguistic(
    provider: Option<&dyn SynonymProvider>,
    parsed: &ParsedQuery,
    builder: &ClauseBuilder<'_>,
    options: &SearchOptions,
) -> Vec<Query> {
    if !options.linguistic_enabled() || parsed.is_empty() {
        return Vec::new();
    }
    let Some(provider) = provider else {
        debug!("Linguistic expansion requested but no synonym provider is configured");
        return Vec::new();
    };

    match provider.get_all_synonyms(&parsed.words, &options.language).await {
        Ok(synonyms) => {
            let synonyms: Vec<String> = synonyms
                .into_iter()
                .filter(|s| !s.trim().is_empty() && !parsed.words.contains(s))
                .collect();
            debug!("Expanding {:?} with {} synonyms", parsed.words, synonyms.len());
            builder.synonyms(&synonyms, parsed.mode)
        }
        Err(e) => {
            warn!("Synonym lookup failed, searching without synonyms: {}", e);
            Vec::new()
        }
    }
}

/// Semantic clauses for every search field, in field order
pub async fn expand_semantic(
    provider: Option<&dyn SemanticProvider>,
    parsed: &ParsedQuery,
    fields: &[String],
    options: &SearchOptions,
) -> SemanticExpansion {
    if !options.semantic_enabled() || parsed.is_empty() {
        return SemanticExpansion::default();
    }
    let unavailable = SemanticExpansion {
        clauses: Vec::new(),
        unavailable: true,
    };
    let Some(provider) = provider else {
        warn!("Semantic search requested but no semantic provider is configured");
        return unavailable;
    };

    match provider.is_model_deployed().await {
        Ok(true) => {}
        Ok(false) => {
            warn!("Semantic model {} is not deployed", provider.model_id());
            return unavailable;
        }
        Err(e) => {
            warn!("Semantic model check failed: {}", e);
            return unavailable;
        }
    }

    let text = parsed.text();
    let clauses = fields
        .iter()
        .enumerate()
        .map(|(rank, field)| provider.create_semantic_clause(&text, field, tier_boost(SEMANTIC_BOOST, rank)))
        .collect();
    SemanticExpansion {
        clauses,
        unavailable: false,
    }
}

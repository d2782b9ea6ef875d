//! Search Executor
//!
//! Ties together query parsing, clause building, expansion, gating and paging
//! into one engine request, and maps the answer back into a `SearchResult`.

use super::clauses::{at_least, ClauseBuilder};
use super::dsl::{BoolQuery, Query, SortClause};
use super::expansion::{expand_linguistic, expand_semantic, SemanticExpansion};
use super::filters::{exclusion_clauses, filter_clauses};
use super::options::SearchOptions;
use super::parser::{ParsedQuery, QueryParser};
use super::ranking::{sort_clauses, ScoreGate};
use super::types::{total_pages, SearchDocument, SearchResult, SearchWarnings};
use crate::backend::{Hit, SearchBackend};
use crate::error::{validate_query, SearchError};
use crate::index::IndexRegistry;
use crate::providers::{SemanticProvider, SynonymProvider};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

/// A fully assembled engine request
#[derive(Debug, Clone)]
pub struct PreparedSearch {
    pub query: Query,
    pub sort: Vec<SortClause>,
    pub from: u64,
    pub size: u32,
    pub page: u32,
    pub warnings: SearchWarnings,
}

impl PreparedSearch {
    /// `_search` request body
    pub fn body(&self) -> Value {
        json!({
            "query": self.query.to_json(),
            "from": self.from,
            "size": self.size,
            "sort": self.sort.iter().map(SortClause::to_json).collect::<Vec<_>>(),
            "track_total_hits": true
        })
    }
}

/// Stateless search front-end over a `SearchBackend`
pub struct SearchEngine {
    backend: Arc<dyn SearchBackend>,
    registry: IndexRegistry,
    synonyms: Option<Arc<dyn SynonymProvider>>,
    semantic: Option<Arc<dyn SemanticProvider>>,
    index_prefix: String,
}

impl SearchEngine {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            registry: IndexRegistry::default(),
            synonyms: None,
            semantic: None,
            index_prefix: String::new(),
        }
    }

    pub fn with_registry(mut self, registry: IndexRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_synonyms(mut self, provider: Arc<dyn SynonymProvider>) -> Self {
        self.synonyms = Some(provider);
        self
    }

    pub fn with_semantic(mut self, provider: Arc<dyn SemanticProvider>) -> Self {
        self.semantic = Some(provider);
        self
    }

    pub fn with_index_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.index_prefix = prefix.into();
        self
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    /// Engine-side name of a logical index
    pub fn qualified_index(&self, index: &str) -> String {
        format!("{}{}", self.index_prefix, index)
    }

    /// Search a registered index using its registered fields
    pub async fn search_registered<D: DeserializeOwned>(
        &self,
        index: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult<D>, SearchError> {
        validate_query(query)?;
        let fields = self.registry.fields(index)?.to_vec();
        self.search(index, &fields, query, options).await
    }

    /// Search `index` over `search_fields` (ordered by importance).
    ///
    /// Fails with `QueryTooLong` before anything else, and with `EngineDisabled`
    /// before any network call. Expansion failures only degrade the result.
    pub async fn search<D: DeserializeOwned>(
        &self,
        index: &str,
        search_fields: &[String],
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult<D>, SearchError> {
        let prepared = self.prepare(search_fields, query, options).await?;
        let target = self.qualified_index(index);
        debug!("Searching {} with {:?}", target, prepared.query);

        let response = self
            .backend
            .search(&target, &prepared.body())
            .await
            .map_err(|e| {
                error!("Search on {} failed: {}", target, e);
                match e {
                    SearchError::EngineDisabled => e,
                    SearchError::EngineUnavailable(_) => e,
                    other => SearchError::EngineUnavailable(other.to_string()),
                }
            })?;

        let total = response.total();
        let total_is_exact = response.total_is_exact();
        let mut hits = response
            .hits
            .hits
            .into_iter()
            .map(document_from_hit::<D>)
            .collect::<Result<Vec<D>, SearchError>>()
            .map_err(|e| {
                error!("Unreadable hit from {}: {}", target, e);
                e
            })?;
        hits.truncate(prepared.size as usize);

        Ok(SearchResult {
            hits,
            total,
            total_is_exact,
            page: prepared.page,
            limit: prepared.size,
            total_pages: total_pages(total, prepared.size),
            warnings: (!prepared.warnings.is_empty()).then_some(prepared.warnings),
        })
    }

    /// Build the complete request without sending it
    pub async fn prepare(
        &self,
        search_fields: &[String],
        query: &str,
        options: &SearchOptions,
    ) -> Result<PreparedSearch, SearchError> {
        validate_query(query)?;
        if !self.backend.is_enabled() {
            return Err(SearchError::EngineDisabled);
        }
        if search_fields.is_empty() {
            return Err(SearchError::InvalidInput("At least one search field is required".to_string()));
        }

        let parsed = QueryParser::parse(query, options.search_mode)?;
        let builder = ClauseBuilder::new(search_fields, options);
        let mut should = builder.primary(&parsed);
        should.extend(builder.ngram(&parsed));

        let (synonym_clauses, semantic) = tokio::join!(
            expand_linguistic(self.synonyms.as_deref(), &parsed, &builder, options),
            expand_semantic(self.semantic.as_deref(), &parsed, search_fields, options),
        );
        should.extend(synonym_clauses);
        let SemanticExpansion { clauses, unavailable } = semantic;
        should.extend(clauses);

        let msm = builder.combined_minimum_should_match(&parsed);
        let query = Self::assemble(&parsed, should, msm, options);
        let warnings = SearchWarnings {
            semantic_search_unavailable: unavailable.then_some(true),
        };

        Ok(PreparedSearch {
            query,
            sort: sort_clauses(options.sort_by, options.sort_order),
            from: options.offset(),
            size: options.effective_limit(),
            page: options.effective_page(),
            warnings,
        })
    }

    /// `bool { must: [gate(text)], filter, must_not }`
    fn assemble(parsed: &ParsedQuery, should: Vec<Query>, msm: u32, options: &SearchOptions) -> Query {
        let text = if parsed.is_empty() || should.is_empty() {
            Query::MatchAll
        } else {
            at_least(should, msm)
        };
        let gated = ScoreGate::apply(text, parsed.word_count(), options.match_type, options.typo_tolerance);

        Query::Bool(BoolQuery {
            must: vec![gated],
            filter: filter_clauses(options),
            must_not: exclusion_clauses(options),
            ..Default::default()
        })
    }
}

/// Source fields plus the engine id under `id`
fn document_from_hit<D: DeserializeOwned>(hit: Hit) -> Result<D, SearchError> {
    let mut source = match hit.source {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            return Err(SearchError::EngineUnavailable(format!(
                "malformed hit {}: non-object source {}",
                hit.id, other
            )))
        }
    };
    source.insert("id".to_string(), Value::String(hit.id));
    serde_json::from_value(Value::Object(source))
        .map_err(|e| SearchError::EngineUnavailable(format!("malformed hit: {}", e)))
}

/// Convenience alias for schema-less results
pub type DocumentResult = SearchResult<SearchDocument>;

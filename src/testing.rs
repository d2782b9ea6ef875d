//! In-memory backend and providers for tests

use crate::backend::{BulkItem, BulkResponse, CreateOutcome, Hit, SearchBackend, SearchResponse, TotalHits, TotalRelation};
use crate::backend::response::HitsEnvelope;
use crate::error::SearchError;
use crate::providers::{semantic_field, SemanticProvider, SynonymProvider};
use crate::search::dsl::Query;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

pub const FAKE_MODEL_ID: &str = ".elser_model_2";

#[derive(Default)]
struct State {
    indexes: HashSet<String>,
    /// index -> id -> source
    documents: HashMap<String, BTreeMap<String, Value>>,
    pipelines: HashMap<String, Value>,
    created_bodies: HashMap<String, Value>,
    create_as_existing: HashSet<String>,
    rejected_ids: HashSet<String>,
    calls: Vec<String>,
    searches: Vec<Value>,
    total_override: Option<TotalHits>,
    pipeline_read_failures: u32,
    pipeline_write_failures: u32,
    unavailable: bool,
    model_deployed: bool,
}

/// Records every call and keeps documents in memory.
///
/// Search returns every document of the index in id order, honoring `_id`
/// exclusions found in `must_not` clauses and `from`/`size` paging. Scoring
/// and text matching are not simulated.
pub struct FakeBackend {
    enabled: bool,
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            enabled: true,
            state: Mutex::new(State::default()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            state: Mutex::new(State::default()),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    /// Gatekeeping shared by every backend call
    fn enter(&self, call: String) -> Result<(), SearchError> {
        if !self.enabled {
            return Err(SearchError::EngineDisabled);
        }
        self.with_state(|s| {
            s.calls.push(call);
            if s.unavailable {
                Err(SearchError::EngineUnavailable("connection refused".to_string()))
            } else {
                Ok(())
            }
        })
    }

    pub fn add_index(&self, index: &str) {
        self.with_state(|s| {
            s.indexes.insert(index.to_string());
        });
    }

    pub fn add_document(&self, index: &str, id: &str, source: Value) {
        self.with_state(|s| {
            s.indexes.insert(index.to_string());
            s.documents
                .entry(index.to_string())
                .or_default()
                .insert(id.to_string(), source);
        });
    }

    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.with_state(|s| s.documents.get(index).and_then(|d| d.get(id)).cloned())
    }

    pub fn document_count(&self, index: &str) -> usize {
        self.with_state(|s| s.documents.get(index).map(BTreeMap::len).unwrap_or(0))
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.with_state(|s| s.unavailable = unavailable);
    }

    pub fn set_model_deployed(&self, deployed: bool) {
        self.with_state(|s| s.model_deployed = deployed);
    }

    /// Index creation answers "already exists" without creating anything
    pub fn fail_create_as_existing(&self, index: &str) {
        self.with_state(|s| {
            s.create_as_existing.insert(index.to_string());
        });
    }

    /// Bulk items for this document id fail with a mapping error
    pub fn reject_document(&self, id: &str) {
        self.with_state(|s| {
            s.rejected_ids.insert(id.to_string());
        });
    }

    /// The next `count` pipeline reads fail as if the engine were unreachable
    pub fn fail_pipeline_reads(&self, count: u32) {
        self.with_state(|s| s.pipeline_read_failures = count);
    }

    /// The next `count` pipeline writes are rejected
    pub fn fail_pipeline_writes(&self, count: u32) {
        self.with_state(|s| s.pipeline_write_failures = count);
    }

    pub fn override_total(&self, total: TotalHits) {
        self.with_state(|s| s.total_override = Some(total));
    }

    pub fn put_pipeline_direct(&self, name: &str, body: Value) {
        self.with_state(|s| {
            s.pipelines.insert(name.to_string(), body);
        });
    }

    pub fn pipeline(&self, name: &str) -> Option<Value> {
        self.with_state(|s| s.pipelines.get(name).cloned())
    }

    pub fn created_body(&self, index: &str) -> Option<Value> {
        self.with_state(|s| s.created_bodies.get(index).cloned())
    }

    pub fn calls(&self) -> Vec<String> {
        self.with_state(|s| s.calls.clone())
    }

    fn count_calls(&self, call: &str) -> usize {
        self.with_state(|s| s.calls.iter().filter(|c| *c == call).count())
    }

    pub fn create_calls(&self, index: &str) -> usize {
        self.count_calls(&format!("create_index:{}", index))
    }

    pub fn exists_calls(&self, index: &str) -> usize {
        self.count_calls(&format!("index_exists:{}", index))
    }

    pub fn search_calls(&self) -> usize {
        self.with_state(|s| s.searches.len())
    }

    /// Body of the most recent search request
    pub fn last_search(&self) -> Option<Value> {
        self.with_state(|s| s.searches.last().cloned())
    }

    fn apply_bulk_line(state: &mut State, action: &str, meta: &Value, source: Option<Value>) -> BulkItem {
        let index = meta["_index"].as_str().unwrap_or_default().to_string();
        let id = meta["_id"].as_str().unwrap_or_default().to_string();
        if state.rejected_ids.contains(&id) {
            return BulkItem {
                id: Some(id),
                status: 400,
                error: Some(json!({ "type": "mapper_parsing_exception" })),
            };
        }
        let docs = state.documents.entry(index.clone()).or_default();
        let status = match action {
            "delete" => {
                if docs.remove(&id).is_some() {
                    200
                } else {
                    404
                }
            }
            "update" => {
                let patch = source.map(|s| s["doc"].clone()).unwrap_or(Value::Null);
                merge_into(docs.entry(id.clone()).or_insert_with(|| json!({})), patch);
                200
            }
            _ => {
                docs.insert(id.clone(), source.unwrap_or(Value::Null));
                201
            }
        };
        state.indexes.insert(index);
        BulkItem {
            id: Some(id),
            status,
            error: None,
        }
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Consume one scripted failure, if any remain
fn take_failure(remaining: &mut u32) -> bool {
    if *remaining == 0 {
        return false;
    }
    *remaining -= 1;
    true
}

fn merge_into(target: &mut Value, patch: Value) {
    if let (Some(target), Value::Object(patch)) = (target.as_object_mut(), patch) {
        for (key, value) in patch {
            target.insert(key, value);
        }
    }
}

/// Every id listed in a `terms: {_id: [...]}` clause under any `must_not`
fn excluded_ids(body: &Value) -> HashSet<String> {
    let mut ids = HashSet::new();
    collect_excluded(body, &mut ids);
    ids
}

fn collect_excluded(value: &Value, ids: &mut HashSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "must_not" {
                    for clause in child.as_array().into_iter().flatten() {
                        for id in clause["terms"]["_id"].as_array().into_iter().flatten() {
                            if let Some(id) = id.as_str() {
                                ids.insert(id.to_string());
                            }
                        }
                    }
                }
                collect_excluded(child, ids);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_excluded(item, ids)),
        _ => {}
    }
}

#[async_trait]
impl SearchBackend for FakeBackend {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        self.enter(format!("index_exists:{}", index))?;
        Ok(self.with_state(|s| s.indexes.contains(index)))
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<CreateOutcome, SearchError> {
        self.enter(format!("create_index:{}", index))?;
        Ok(self.with_state(|s| {
            if s.create_as_existing.contains(index) || s.indexes.contains(index) {
                return CreateOutcome::AlreadyExists;
            }
            s.indexes.insert(index.to_string());
            s.created_bodies.insert(index.to_string(), body.clone());
            CreateOutcome::Created
        }))
    }

    async fn delete_index(&self, index: &str) -> Result<bool, SearchError> {
        self.enter(format!("delete_index:{}", index))?;
        Ok(self.with_state(|s| {
            s.documents.remove(index);
            s.indexes.remove(index)
        }))
    }

    async fn get_pipeline(&self, name: &str) -> Result<Option<Value>, SearchError> {
        self.enter(format!("get_pipeline:{}", name))?;
        let failing = self.with_state(|s| take_failure(&mut s.pipeline_read_failures));
        if failing {
            return Err(SearchError::EngineUnavailable("pipeline read timed out".to_string()));
        }
        Ok(self.pipeline(name))
    }

    async fn put_pipeline(&self, name: &str, body: &Value) -> Result<(), SearchError> {
        self.enter(format!("put_pipeline:{}", name))?;
        let failing = self.with_state(|s| take_failure(&mut s.pipeline_write_failures));
        if failing {
            return Err(SearchError::Provisioning {
                index: name.to_string(),
                reason: "model not found".to_string(),
            });
        }
        self.put_pipeline_direct(name, body.clone());
        Ok(())
    }

    async fn search(&self, index: &str, body: &Value) -> Result<SearchResponse, SearchError> {
        self.enter(format!("search:{}", index))?;
        let excluded = excluded_ids(body);
        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;

        Ok(self.with_state(|s| {
            s.searches.push(body.clone());
            let matching: Vec<Hit> = s
                .documents
                .get(index)
                .into_iter()
                .flatten()
                .filter(|(id, _)| !excluded.contains(*id))
                .map(|(id, source)| Hit {
                    id: id.clone(),
                    score: Some(1.0),
                    source: source.clone(),
                })
                .collect();
            let total = s.total_override.unwrap_or(TotalHits {
                value: matching.len() as u64,
                relation: TotalRelation::Eq,
            });
            SearchResponse {
                hits: HitsEnvelope {
                    total: Some(total),
                    hits: matching.into_iter().skip(from).take(size).collect(),
                },
            }
        }))
    }

    async fn index_document(&self, index: &str, id: &str, document: &Value) -> Result<(), SearchError> {
        self.enter(format!("index_document:{}/{}", index, id))?;
        self.add_document(index, id, document.clone());
        Ok(())
    }

    async fn update_document(&self, index: &str, id: &str, document: &Value) -> Result<(), SearchError> {
        self.enter(format!("update_document:{}/{}", index, id))?;
        self.with_state(|s| {
            s.indexes.insert(index.to_string());
            let docs = s.documents.entry(index.to_string()).or_default();
            merge_into(docs.entry(id.to_string()).or_insert_with(|| json!({})), document.clone());
        });
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), SearchError> {
        self.enter(format!("delete_document:{}/{}", index, id))?;
        self.with_state(|s| {
            if let Some(docs) = s.documents.get_mut(index) {
                docs.remove(id);
            }
        });
        Ok(())
    }

    async fn bulk(&self, body: String) -> Result<BulkResponse, SearchError> {
        self.enter("bulk".to_string())?;
        let mut lines = body.lines().filter(|l| !l.trim().is_empty());
        let mut items = Vec::new();

        while let Some(line) = lines.next() {
            let action: Value = serde_json::from_str(line)?;
            let Some((kind, meta)) = action.as_object().and_then(|o| o.iter().next()) else {
                return Err(SearchError::MalformedResponse(format!("bad bulk action: {}", line)));
            };
            let source = if kind == "delete" {
                None
            } else {
                let line = lines
                    .next()
                    .ok_or_else(|| SearchError::MalformedResponse("bulk source missing".to_string()))?;
                Some(serde_json::from_str::<Value>(line)?)
            };
            let item = self.with_state(|s| Self::apply_bulk_line(s, kind, meta, source));
            let mut entry = HashMap::new();
            entry.insert(kind.clone(), item);
            items.push(entry);
        }

        let errors = items.iter().flat_map(|e| e.iter()).any(|(k, i)| i.is_failure(k));
        Ok(BulkResponse { errors, items })
    }

    async fn trained_model_stats(&self, model_id: &str) -> Result<Value, SearchError> {
        self.enter(format!("trained_model_stats:{}", model_id))?;
        let deployed = self.with_state(|s| s.model_deployed);
        let mut model = json!({ "model_id": model_id });
        if deployed {
            model["deployment_stats"] = json!({ "state": "started" });
        }
        Ok(json!({ "count": 1, "trained_model_stats": [model] }))
    }
}

/// Returns a fixed synonym list for any input
pub struct StaticSynonyms {
    synonyms: Vec<String>,
    seen: Mutex<Vec<(Vec<String>, String)>>,
}

impl StaticSynonyms {
    pub fn new(synonyms: &[&str]) -> Self {
        Self {
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// (words, language) of every lookup so far
    pub fn lookups(&self) -> Vec<(Vec<String>, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynonymProvider for StaticSynonyms {
    async fn get_all_synonyms(&self, words: &[String], language: &str) -> Result<Vec<String>, SearchError> {
        self.seen
            .lock()
            .unwrap()
            .push((words.to_vec(), language.to_string()));
        Ok(self.synonyms.clone())
    }
}

pub struct FailingSynonyms;

#[async_trait]
impl SynonymProvider for FailingSynonyms {
    async fn get_all_synonyms(&self, _words: &[String], _language: &str) -> Result<Vec<String>, SearchError> {
        Err(SearchError::Provider("thesaurus offline".to_string()))
    }
}

/// Semantic provider with a scripted deployment answer
pub struct FakeSemantic {
    deployed: Result<bool, String>,
}

impl FakeSemantic {
    pub fn deployed(deployed: bool) -> Self {
        Self { deployed: Ok(deployed) }
    }

    pub fn failing() -> Self {
        Self {
            deployed: Err("model stats unavailable".to_string()),
        }
    }
}

#[async_trait]
impl SemanticProvider for FakeSemantic {
    fn model_id(&self) -> &str {
        FAKE_MODEL_ID
    }

    async fn is_model_deployed(&self) -> Result<bool, SearchError> {
        self.deployed.clone().map_err(SearchError::Provider)
    }

    fn create_semantic_clause(&self, text: &str, field: &str, boost: f64) -> Query {
        Query::TextExpansion {
            field: semantic_field(field),
            model_id: FAKE_MODEL_ID.to_string(),
            text: text.to_string(),
            boost,
        }
    }
}

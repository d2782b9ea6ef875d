//! Index Manager
//!
//! Lazily provisions indexes (and their semantic ingest pipelines) and remembers
//! which ones are known to exist.
//!
//! Per-index state: `Unknown -> Checking -> (Exists | Creating -> Exists)`.
//! A failed check or creation drops the index back to `Unknown` so the next call
//! starts over.

use super::mapping::index_body;
use super::pipeline::{pipeline_body, pipeline_matches, pipeline_name};
use crate::backend::{CreateOutcome, SearchBackend};
use crate::config::EngineConfig;
use crate::error::SearchError;
use crate::providers::SemanticProvider;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Unknown,
    Checking,
    Creating,
    Exists,
}

/// Bounded polling: how many re-checks, and how long between them
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub attempts: u32,
    pub delay: Duration,
}

impl PollSettings {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            attempts: config.existence_poll_attempts,
            delay: config.poll_delay(),
        }
    }
}

/// Semantic enrichment wiring for new indexes
#[derive(Clone)]
pub struct SemanticPipeline {
    pub provider: Arc<dyn SemanticProvider>,
    /// Base name; the index name is appended
    pub pipeline: String,
}

/// Per-index provisioning slot: the observable state, plus a lock serializing
/// provisioning of that index only
#[derive(Debug)]
struct IndexSlot {
    state: Mutex<IndexState>,
    provisioning: Mutex<()>,
}

impl IndexSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(IndexState::Unknown),
            provisioning: Mutex::new(()),
        }
    }

    async fn set(&self, state: IndexState) {
        *self.state.lock().await = state;
    }

    async fn get(&self) -> IndexState {
        *self.state.lock().await
    }
}

pub struct IndexManager {
    backend: Arc<dyn SearchBackend>,
    language: String,
    poll: PollSettings,
    semantic: Option<SemanticPipeline>,
    slots: Mutex<HashMap<String, Arc<IndexSlot>>>,
}

impl IndexManager {
    pub fn new(backend: Arc<dyn SearchBackend>, language: impl Into<String>, poll: PollSettings) -> Self {
        Self {
            backend,
            language: language.into(),
            poll,
            semantic: None,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_semantic(mut self, semantic: SemanticPipeline) -> Self {
        self.semantic = Some(semantic);
        self
    }

    pub async fn state(&self, index: &str) -> IndexState {
        let slot = self.slots.lock().await.get(index).cloned();
        match slot {
            Some(slot) => slot.get().await,
            None => IndexState::Unknown,
        }
    }

    async fn slot(&self, index: &str) -> Arc<IndexSlot> {
        self.slots
            .lock()
            .await
            .entry(index.to_string())
            .or_insert_with(|| Arc::new(IndexSlot::new()))
            .clone()
    }

    /// Make sure `index` exists, creating it with a generated mapping if needed.
    ///
    /// Provisioning of one index is serialized within this process while other
    /// indexes proceed independently; across processes an "already exists"
    /// answer from the engine counts as success.
    pub async fn ensure_index_exists(&self, index: &str, search_fields: &[String]) -> Result<(), SearchError> {
        if !self.backend.is_enabled() {
            return Err(SearchError::EngineDisabled);
        }

        let slot = self.slot(index).await;
        if slot.get().await == IndexState::Exists {
            return Ok(());
        }

        let _provisioning = slot.provisioning.lock().await;
        // another caller may have finished while we waited
        if slot.get().await == IndexState::Exists {
            return Ok(());
        }

        slot.set(IndexState::Checking).await;
        let result = self.provision(index, search_fields, &slot).await;
        let state = if result.is_ok() {
            IndexState::Exists
        } else {
            IndexState::Unknown
        };
        slot.set(state).await;
        result
    }

    async fn provision(&self, index: &str, search_fields: &[String], slot: &IndexSlot) -> Result<(), SearchError> {
        if self.wait_for_existence(index).await? {
            debug!("Index {} already exists", index);
            return Ok(());
        }

        slot.set(IndexState::Creating).await;
        let pipeline = self.ensure_pipeline(index, search_fields).await?;
        let body = index_body(search_fields, &self.language, pipeline.as_deref());

        match self.backend.create_index(index, &body).await {
            Ok(CreateOutcome::Created) => {
                info!("Created index {} with fields {:?}", index, search_fields);
                Ok(())
            }
            Ok(CreateOutcome::AlreadyExists) => {
                info!("Index {} was created by another process", index);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to create index {}: {}", index, e);
                Err(e)
            }
        }
    }

    /// Check, then re-check up to `poll.attempts` times with a fixed delay
    async fn wait_for_existence(&self, index: &str) -> Result<bool, SearchError> {
        if self.backend.index_exists(index).await? {
            return Ok(true);
        }
        for attempt in 1..=self.poll.attempts {
            tokio::time::sleep(self.poll.delay).await;
            if self.backend.index_exists(index).await? {
                debug!("Index {} appeared after {} re-checks", index, attempt);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Create or verify the semantic pipeline for `index`.
    ///
    /// Returns the pipeline name to use as the index default, or `None` when
    /// semantic enrichment is not configured. A configured pipeline that cannot
    /// be read or installed fails provisioning, so the index is never created
    /// without it.
    async fn ensure_pipeline(&self, index: &str, search_fields: &[String]) -> Result<Option<String>, SearchError> {
        let Some(semantic) = self.semantic.as_ref() else {
            return Ok(None);
        };
        let name = pipeline_name(&semantic.pipeline, index);
        let desired = pipeline_body(search_fields, semantic.provider.model_id());
        let failed = |e: SearchError| {
            warn!("Pipeline {} unavailable, not creating {}: {}", name, index, e);
            SearchError::Provisioning {
                index: index.to_string(),
                reason: format!("ingest pipeline {}: {}", name, e),
            }
        };

        let existing = self.backend.get_pipeline(&name).await.map_err(&failed)?;
        if existing.as_ref().is_some_and(|p| pipeline_matches(p, &desired)) {
            debug!("Pipeline {} is up to date", name);
            return Ok(Some(name));
        }

        self.backend.put_pipeline(&name, &desired).await.map_err(&failed)?;
        info!("Installed ingest pipeline {}", name);
        Ok(Some(name))
    }

    /// Delete `index` and wait (bounded) until the engine no longer reports it.
    /// Returns false when there was nothing to delete.
    pub async fn drop_index(&self, index: &str) -> Result<bool, SearchError> {
        let slot = self.slot(index).await;
        let _provisioning = slot.provisioning.lock().await;
        slot.set(IndexState::Unknown).await;

        let deleted = self.backend.delete_index(index).await?;
        if !deleted {
            debug!("Index {} did not exist", index);
            return Ok(false);
        }

        for _ in 0..=self.poll.attempts {
            if !self.backend.index_exists(index).await? {
                info!("Dropped index {}", index);
                return Ok(true);
            }
            tokio::time::sleep(self.poll.delay).await;
        }
        Err(SearchError::Provisioning {
            index: index.to_string(),
            reason: "index still present after deletion".to_string(),
        })
    }
}

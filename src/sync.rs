//! Document Sync
//!
//! Pushes projected documents into the engine. Sync never fails its caller:
//! every problem is logged and counted in the returned `SyncReport`.

use crate::backend::SearchBackend;
use crate::error::SearchError;
use crate::search::types::SearchDocument;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Payloads per `_bulk` request
pub const BULK_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOperation {
    Index(SearchDocument),
    /// Partial update; missing documents are created
    Update(SearchDocument),
    Delete(String),
}

impl SyncOperation {
    pub fn id(&self) -> &str {
        match self {
            SyncOperation::Index(doc) | SyncOperation::Update(doc) => &doc.id,
            SyncOperation::Delete(id) => id,
        }
    }

    fn action(&self) -> &'static str {
        match self {
            SyncOperation::Index(_) => "index",
            SyncOperation::Update(_) => "update",
            SyncOperation::Delete(_) => "delete",
        }
    }
}

/// One operation against one logical index
#[derive(Debug, Clone, PartialEq)]
pub struct SyncPayload {
    pub index: String,
    pub operation: SyncOperation,
}

impl SyncPayload {
    pub fn new(index: impl Into<String>, operation: SyncOperation) -> Self {
        Self {
            index: index.into(),
            operation,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Engine disabled; nothing was sent
    pub skipped: bool,
}

impl SyncReport {
    fn skipped(attempted: usize) -> Self {
        Self {
            attempted,
            skipped: true,
            ..Default::default()
        }
    }

    fn merge(&mut self, other: SyncReport) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

pub struct DocumentSync {
    backend: Arc<dyn SearchBackend>,
    index_prefix: String,
}

impl DocumentSync {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            index_prefix: String::new(),
        }
    }

    pub fn with_index_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.index_prefix = prefix.into();
        self
    }

    fn target(&self, index: &str) -> String {
        format!("{}{}", self.index_prefix, index)
    }

    /// Apply a single operation
    pub async fn sync(&self, index: &str, operation: SyncOperation) -> SyncReport {
        if !self.backend.is_enabled() {
            debug!("Search engine disabled, skipping {} of {}", operation.action(), operation.id());
            return SyncReport::skipped(1);
        }

        let target = self.target(index);
        let result: Result<(), SearchError> = match &operation {
            SyncOperation::Index(doc) => self.backend.index_document(&target, &doc.id, &doc.source()).await,
            SyncOperation::Update(doc) => self.backend.update_document(&target, &doc.id, &doc.source()).await,
            SyncOperation::Delete(id) => self.backend.delete_document(&target, id).await,
        };

        match result {
            Ok(()) => {
                debug!("Synced {} {}/{}", operation.action(), target, operation.id());
                SyncReport {
                    attempted: 1,
                    succeeded: 1,
                    ..Default::default()
                }
            }
            Err(e) => {
                error!("Failed to {} {}/{}: {}", operation.action(), target, operation.id(), e);
                SyncReport {
                    attempted: 1,
                    failed: 1,
                    ..Default::default()
                }
            }
        }
    }

    /// Apply many operations through `_bulk`, in chunks
    pub async fn bulk_sync(&self, payloads: &[SyncPayload]) -> SyncReport {
        if payloads.is_empty() {
            return SyncReport::default();
        }
        if !self.backend.is_enabled() {
            debug!("Search engine disabled, skipping bulk sync of {} documents", payloads.len());
            return SyncReport::skipped(payloads.len());
        }

        let mut report = SyncReport::default();
        for chunk in payloads.chunks(BULK_CHUNK_SIZE) {
            report.merge(self.bulk_chunk(chunk).await);
        }
        info!(
            "Bulk sync finished: {} succeeded, {} failed",
            report.succeeded, report.failed
        );
        report
    }

    async fn bulk_chunk(&self, chunk: &[SyncPayload]) -> SyncReport {
        let attempted = chunk.len();
        match self.backend.bulk(self.bulk_body(chunk)).await {
            Ok(response) => {
                let failures = response.failures();
                for (action, item) in &failures {
                    warn!(
                        "Bulk {} of {} failed ({}): {}",
                        action,
                        item.id.as_deref().unwrap_or("?"),
                        item.status,
                        item.error.as_ref().map(|e| e.to_string()).unwrap_or_default()
                    );
                }
                let failed = failures.len().min(attempted);
                SyncReport {
                    attempted,
                    succeeded: attempted - failed,
                    failed,
                    skipped: false,
                }
            }
            Err(e) => {
                error!("Bulk request of {} operations failed: {}", attempted, e);
                SyncReport {
                    attempted,
                    failed: attempted,
                    ..Default::default()
                }
            }
        }
    }

    /// Newline-delimited `_bulk` body
    pub fn bulk_body(&self, payloads: &[SyncPayload]) -> String {
        let mut body = String::new();
        for payload in payloads {
            let op = &payload.operation;
            let meta = json!({ op.action(): { "_index": self.target(&payload.index), "_id": op.id() } });
            body.push_str(&meta.to_string());
            body.push('\n');
            match op {
                SyncOperation::Index(doc) => {
                    body.push_str(&doc.source().to_string());
                    body.push('\n');
                }
                SyncOperation::Update(doc) => {
                    body.push_str(&json!({ "doc": doc.source(), "doc_as_upsert": true }).to_string());
                    body.push('\n');
                }
                SyncOperation::Delete(_) => {}
            }
        }
        body
    }
}

/// Run a single sync in the background; the caller may drop the handle
pub fn spawn_sync(sync: Arc<DocumentSync>, index: String, operation: SyncOperation) -> JoinHandle<SyncReport> {
    tokio::spawn(async move { sync.sync(&index, operation).await })
}

//! Startup wiring
//!
//! Indexes are registered explicitly while building the service; once built,
//! the registration table is read-only and shared by search, provisioning and sync.

use crate::backend::{ElasticClient, SearchBackend};
use crate::config::EngineConfig;
use crate::error::SearchError;
use crate::index::manager::{IndexManager, PollSettings, SemanticPipeline};
use crate::index::{IndexRegistry, IndexRegistryBuilder, Projector};
use crate::providers::{ElserSemanticProvider, SemanticProvider, SynonymProvider, ThesaurusSynonymProvider};
use crate::search::{SearchEngine, SearchOptions, SearchResult};
use crate::sync::DocumentSync;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of provisioning every registered index
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InitReport {
    pub ready: Vec<String>,
    /// (index, reason)
    pub failed: Vec<(String, String)>,
    pub skipped: bool,
}

pub struct SearchServiceBuilder {
    config: EngineConfig,
    backend: Option<Arc<dyn SearchBackend>>,
    registry: IndexRegistryBuilder,
    synonyms: Option<Arc<dyn SynonymProvider>>,
    semantic: Option<Arc<dyn SemanticProvider>>,
}

impl SearchServiceBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            backend: None,
            registry: IndexRegistryBuilder::new(),
            synonyms: None,
            semantic: None,
        }
    }

    /// Use a specific backend instead of an `ElasticClient` built from config
    pub fn backend(mut self, backend: Arc<dyn SearchBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn register_index<S: AsRef<str>>(mut self, name: &str, fields: &[S]) -> Result<Self, SearchError> {
        self.registry = self.registry.register(name, fields)?;
        Ok(self)
    }

    pub fn register_projector<P: Projector>(mut self) -> Result<Self, SearchError> {
        self.registry = self.registry.register_projector::<P>()?;
        Ok(self)
    }

    pub fn synonyms(mut self, provider: Arc<dyn SynonymProvider>) -> Self {
        self.synonyms = Some(provider);
        self
    }

    pub fn semantic(mut self, provider: Arc<dyn SemanticProvider>) -> Self {
        self.semantic = Some(provider);
        self
    }

    /// Register configured indexes and construct default collaborators for
    /// anything not supplied explicitly
    pub fn build(self) -> Result<SearchService, SearchError> {
        let config = self.config;
        let backend: Arc<dyn SearchBackend> = match self.backend {
            Some(backend) => backend,
            None => Arc::new(ElasticClient::new(&config)?),
        };

        let mut registry = self.registry;
        for index in &config.indexes {
            registry = registry.register(&index.name, index.search_fields.as_slice())?;
        }
        let registry = registry.build();

        let synonyms: Option<Arc<dyn SynonymProvider>> = match (self.synonyms, &config.thesaurus) {
            (Some(provider), _) => Some(provider),
            (None, Some(path)) => Some(Arc::new(ThesaurusSynonymProvider::from_path(path)?)),
            (None, None) => None,
        };
        let semantic: Option<Arc<dyn SemanticProvider>> = match (self.semantic, &config.semantic) {
            (Some(provider), _) => Some(provider),
            (None, Some(settings)) => Some(Arc::new(ElserSemanticProvider::new(
                backend.clone(),
                settings.model_id.clone(),
            ))),
            (None, None) => None,
        };

        let mut manager = IndexManager::new(
            backend.clone(),
            config.default_language.clone(),
            PollSettings::from_config(&config),
        );
        if let (Some(provider), Some(settings)) = (&semantic, &config.semantic) {
            manager = manager.with_semantic(SemanticPipeline {
                provider: provider.clone(),
                pipeline: settings.pipeline.clone(),
            });
        }

        let mut engine = SearchEngine::new(backend.clone())
            .with_registry(registry)
            .with_index_prefix(config.index_prefix.clone());
        if let Some(provider) = synonyms {
            engine = engine.with_synonyms(provider);
        }
        if let Some(provider) = semantic {
            engine = engine.with_semantic(provider);
        }

        let sync = Arc::new(DocumentSync::new(backend).with_index_prefix(config.index_prefix.clone()));

        Ok(SearchService {
            config,
            engine,
            manager,
            sync,
        })
    }
}

/// Search, provisioning and sync over one engine connection
pub struct SearchService {
    config: EngineConfig,
    engine: SearchEngine,
    manager: IndexManager,
    sync: Arc<DocumentSync>,
}

impl SearchService {
    pub fn builder(config: EngineConfig) -> SearchServiceBuilder {
        SearchServiceBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }

    pub fn registry(&self) -> &IndexRegistry {
        self.engine.registry()
    }

    pub fn manager(&self) -> &IndexManager {
        &self.manager
    }

    pub fn sync(&self) -> Arc<DocumentSync> {
        self.sync.clone()
    }

    pub async fn search<D: DeserializeOwned>(
        &self,
        index: &str,
        search_fields: &[String],
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult<D>, SearchError> {
        self.engine.search(index, search_fields, query, options).await
    }

    pub async fn search_registered<D: DeserializeOwned>(
        &self,
        index: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult<D>, SearchError> {
        self.engine.search_registered(index, query, options).await
    }

    /// Provision one registered index
    pub async fn ensure_registered_index(&self, index: &str) -> Result<(), SearchError> {
        let fields = self.registry().fields(index)?;
        self.manager
            .ensure_index_exists(&self.config.qualified_index(index), fields)
            .await
    }

    /// Provision every registered index. Safe to call repeatedly; indexes already
    /// known to exist are not checked again.
    pub async fn initialize_registered_indexes(&self) -> InitReport {
        if !self.engine.backend().is_enabled() {
            info!("Search engine disabled, skipping index initialization");
            return InitReport {
                skipped: true,
                ..Default::default()
            };
        }

        let mut report = InitReport::default();
        for registration in self.registry().iter() {
            let target = self.config.qualified_index(&registration.name);
            match self
                .manager
                .ensure_index_exists(&target, &registration.search_fields)
                .await
            {
                Ok(()) => report.ready.push(target),
                Err(e) => {
                    error!("Failed to initialize index {}: {}", target, e);
                    report.failed.push((target, e.to_string()));
                }
            }
        }
        info!(
            "Initialized {} indexes ({} failed)",
            report.ready.len(),
            report.failed.len()
        );
        report
    }
}

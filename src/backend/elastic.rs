//! Elasticsearch REST client

use super::response::{BulkResponse, CreateOutcome, ErrorEnvelope, SearchResponse};
use super::SearchBackend;
use crate::config::EngineConfig;
use crate::error::SearchError;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

/// Longest slice of an unparseable error body kept in error messages
const MAX_ERROR_BODY: usize = 300;

/// `SearchBackend` over HTTP
#[derive(Clone)]
pub struct ElasticClient {
    client: Client,
    /// `None` when the engine is disabled
    base: Option<Url>,
    username: Option<String>,
    password: Option<String>,
}

impl ElasticClient {
    pub fn new(config: &EngineConfig) -> Result<Self, SearchError> {
        let base = if config.enabled {
            Some(config.base_url()?)
        } else {
            None
        };
        Ok(Self {
            client: crate::http::engine_client(config)?,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, SearchError> {
        let base = self.base.as_ref().ok_or(SearchError::EngineDisabled)?;
        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, SearchError> {
        let request = self.client.request(method, self.url(path)?);
        Ok(match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_deref()),
            None => request,
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, String), SearchError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    fn failure(operation: &str, status: StatusCode, body: &str) -> SearchError {
        SearchError::EngineUnavailable(format!(
            "{} failed with {}: {}",
            operation,
            status,
            describe_error(body)
        ))
    }
}

fn doc_path(index: &str, endpoint: &str, id: &str) -> String {
    format!(
        "{}/{}/{}",
        urlencoding::encode(index),
        endpoint,
        urlencoding::encode(id)
    )
}

/// Engine error type and reason, or the (truncated) raw body
fn describe_error(body: &str) -> String {
    match ErrorEnvelope::parse(body) {
        Some(cause) => match cause.reason {
            Some(reason) => format!("{}: {}", cause.kind, reason),
            None => cause.kind,
        },
        None => body.chars().take(MAX_ERROR_BODY).collect(),
    }
}

#[async_trait]
impl SearchBackend for ElasticClient {
    fn is_enabled(&self) -> bool {
        self.base.is_some()
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let request = self.request(Method::HEAD, &urlencoding::encode(index))?;
        let (status, body) = self.send(request).await?;
        match status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(Self::failure("index existence check", s, &body)),
        }
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<CreateOutcome, SearchError> {
        let request = self.request(Method::PUT, &urlencoding::encode(index))?.json(body);
        let (status, text) = self.send(request).await?;
        if status.is_success() {
            return Ok(CreateOutcome::Created);
        }
        match ErrorEnvelope::parse(&text) {
            Some(cause) if cause.kind == "resource_already_exists_exception" => {
                debug!("Index {} was created concurrently", index);
                Ok(CreateOutcome::AlreadyExists)
            }
            _ if status.is_server_error() => Err(Self::failure("index creation", status, &text)),
            _ => Err(SearchError::Provisioning {
                index: index.to_string(),
                reason: describe_error(&text),
            }),
        }
    }

    async fn delete_index(&self, index: &str) -> Result<bool, SearchError> {
        let request = self.request(Method::DELETE, &urlencoding::encode(index))?;
        let (status, body) = self.send(request).await?;
        match status {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            s => Err(Self::failure("index deletion", s, &body)),
        }
    }

    async fn get_pipeline(&self, name: &str) -> Result<Option<Value>, SearchError> {
        let path = format!("_ingest/pipeline/{}", urlencoding::encode(name));
        let (status, body) = self.send(self.request(Method::GET, &path)?).await?;
        match status {
            s if s.is_success() => {
                let mut pipelines: Value = serde_json::from_str(&body)?;
                Ok(pipelines.get_mut(name).map(Value::take))
            }
            StatusCode::NOT_FOUND => Ok(None),
            s => Err(Self::failure("pipeline lookup", s, &body)),
        }
    }

    async fn put_pipeline(&self, name: &str, body: &Value) -> Result<(), SearchError> {
        let path = format!("_ingest/pipeline/{}", urlencoding::encode(name));
        let (status, text) = self.send(self.request(Method::PUT, &path)?.json(body)).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(SearchError::Provisioning {
                index: name.to_string(),
                reason: describe_error(&text),
            })
        }
    }

    async fn search(&self, index: &str, body: &Value) -> Result<SearchResponse, SearchError> {
        let path = format!("{}/_search", urlencoding::encode(index));
        let (status, text) = self.send(self.request(Method::POST, &path)?.json(body)).await?;
        if !status.is_success() {
            warn!("Search on {} failed with {}", index, status);
            return Err(Self::failure("search", status, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn index_document(&self, index: &str, id: &str, document: &Value) -> Result<(), SearchError> {
        let request = self.request(Method::PUT, &doc_path(index, "_doc", id))?.json(document);
        let (status, body) = self.send(request).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::failure("document index", status, &body))
        }
    }

    async fn update_document(&self, index: &str, id: &str, document: &Value) -> Result<(), SearchError> {
        let body = json!({ "doc": document, "doc_as_upsert": true });
        let request = self.request(Method::POST, &doc_path(index, "_update", id))?.json(&body);
        let (status, text) = self.send(request).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::failure("document update", status, &text))
        }
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), SearchError> {
        let request = self.request(Method::DELETE, &doc_path(index, "_doc", id))?;
        let (status, body) = self.send(request).await?;
        match status {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => {
                debug!("Document {}/{} already absent", index, id);
                Ok(())
            }
            s => Err(Self::failure("document delete", s, &body)),
        }
    }

    async fn bulk(&self, body: String) -> Result<BulkResponse, SearchError> {
        let request = self
            .request(Method::POST, "_bulk")?
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body);
        let (status, text) = self.send(request).await?;
        if !status.is_success() {
            return Err(Self::failure("bulk", status, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn trained_model_stats(&self, model_id: &str) -> Result<Value, SearchError> {
        let path = format!("_ml/trained_models/{}/_stats", urlencoding::encode(model_id));
        let (status, body) = self.send(self.request(Method::GET, &path)?).await?;
        match status {
            s if s.is_success() => Ok(serde_json::from_str(&body)?),
            StatusCode::NOT_FOUND => Ok(Value::Null),
            s => Err(Self::failure("model stats", s, &body)),
        }
    }
}

//! HTTP client for the ingestion, validation and translation backend.
//!
//! Configuration comes from [`Config`]: `backend_url` (default
//! `http://127.0.0.1:5000`) and `request_timeout_secs`. Every request carries the
//! timeout. A [`RequestSlot`] lets a newer request of one kind cancel the older
//! one still in flight, so a late reply never overwrites a newer one.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tokio::task::AbortHandle;

use selector_core::{
    FeatureTree, IngestResponse, TranslateRequest, TranslateResponse, TreeError,
    ValidationRequest, ValidationResponse,
};

use crate::config::Config;

/// Backend request kinds. Each kind has its own slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Ingest,
    Validate,
    Translate,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingest => "ingest",
            Self::Validate => "validate",
            Self::Translate => "translate",
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {0}")]
    Server(String),

    #[error(transparent)]
    Malformed(#[from] TreeError),

    #[error("Superseded by a newer {} request", .0.as_str())]
    Superseded(RequestKind),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}

/// Error body the backend sends with non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.backend_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, &url).timeout(self.timeout)
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody {
                error,
                details: Some(details),
            }) => format!("{}: {}", error, details),
            Ok(ErrorBody { error, .. }) => error,
            Err(_) => body,
        };
        tracing::warn!(%status, "Backend returned {}", message);
        Err(ClientError::Server(format_status(status, &message)))
    }

    /// Forward a document verbatim to the ingestion endpoint.
    pub async fn ingest(&self, document: String) -> Result<IngestResponse, ClientError> {
        tracing::debug!(bytes = document.len(), "Sending document for ingestion");
        let response = self
            .request(Method::POST, "/parse-xml")
            .json(&serde_json::json!({ "xml": document }))
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Ingest a document and build its tree in one step.
    pub async fn ingest_tree(
        &self,
        document: String,
    ) -> Result<(FeatureTree, IngestResponse), ClientError> {
        let response = self.ingest(document).await?;
        let tree = FeatureTree::from_ingest(&response)?;
        Ok((tree, response))
    }

    pub async fn validate(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationResponse, ClientError> {
        tracing::debug!(
            mandatory = request.mandatory.len(),
            xor_groups = request.xor.len(),
            or_groups = request.or.len(),
            and_groups = request.and.len(),
            "Sending configuration for validation"
        );
        let response = self
            .request(Method::POST, "/validate-configuration")
            .json(request)
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn translate(&self, prompt: String) -> Result<TranslateResponse, ClientError> {
        let response = self
            .request(Method::POST, "/translate")
            .json(&TranslateRequest { prompt })
            .send()
            .await?;
        self.handle_response(response).await
    }
}

fn format_status(status: StatusCode, message: &str) -> String {
    if message.is_empty() {
        status.to_string()
    } else {
        format!("{}: {}", status, message)
    }
}

/// Holds the in-flight request of one kind.
#[derive(Debug, Clone, Default)]
pub struct RequestSlot {
    current: Arc<Mutex<Option<AbortHandle>>>,
}

impl RequestSlot {
    /// Run `request` in this slot, aborting whatever was running before.
    pub async fn run<T, F>(&self, kind: RequestKind, request: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::spawn(request);
        let previous = self
            .current
            .lock()
            .expect("request slot lock poisoned")
            .replace(handle.abort_handle());
        if let Some(previous) = previous {
            tracing::debug!(kind = kind.as_str(), "Superseding in-flight request");
            previous.abort();
        }

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(ClientError::Superseded(kind)),
            Err(e) => Err(ClientError::Server(format!(
                "{} request failed: {}",
                kind.as_str(),
                e
            ))),
        }
    }
}

/// One slot per request kind.
#[derive(Debug, Clone, Default)]
pub struct RequestSlots {
    pub ingest: RequestSlot,
    pub validate: RequestSlot,
    pub translate: RequestSlot,
}

impl RequestSlots {
    pub fn slot(&self, kind: RequestKind) -> &RequestSlot {
        match kind {
            RequestKind::Ingest => &self.ingest,
            RequestKind::Validate => &self.validate,
            RequestKind::Translate => &self.translate,
        }
    }
}

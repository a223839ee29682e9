//! Backend access
//!
//! `AnnotationStore` is the async seam between the session controller
//! and the HTTP backend; `HttpGateway` is the production
//! implementation of the wire contract:
//!
//! - `GET /basenames` → document id list
//! - `GET /versions` → version list
//! - `GET /pagedata/{id}/{version}` → `{text, annotations, checked?, transkribus_url?}`
//! - `PUT /annotations/{id}/{version}` ← `{annotations, checked}`
//! - `GET /checks` → per-document sign-off summary
//!
//! Every failure is swallowed at this layer: non-2xx statuses,
//! transport errors and decode errors are logged and replaced by the
//! documented default value. The controller treats a failed fetch
//! identically to an empty result, so nothing here returns `Err`.

use annev_common::config::SessionConfig;
use annev_common::model::{Document, PageData, SelectionKey};
use annev_common::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

/// `GET /checks` payload: document id → reviewer → sign-off flag
pub type ChecksSummary = BTreeMap<String, BTreeMap<String, bool>>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Async backend operations consumed by the session controller
///
/// Object-safe so the controller can hold `Arc<dyn AnnotationStore>`
/// and tests can substitute an in-memory double with scripted timing.
#[async_trait]
pub trait AnnotationStore: Send + Sync {
    /// Available document basenames; empty on any failure
    async fn list_base_names(&self) -> Vec<String>;

    /// Available annotation versions; empty on any failure
    async fn list_versions(&self) -> Vec<String>;

    /// Page payload for a selection key
    ///
    /// Short-circuits to the default empty payload, without a network
    /// call, when the key is incomplete.
    async fn fetch_page(&self, key: &SelectionKey) -> PageData;

    /// Persist the Document's annotations and judgments
    ///
    /// No-op (no network call) for an empty annotation set, so an
    /// accidental save can never clobber a server-side baseline.
    /// Returns whether a write was issued and accepted.
    async fn save_annotations(&self, doc: &Document) -> bool;

    /// Per-document sign-off summary; empty on any failure
    async fn fetch_checks(&self) -> ChecksSummary;
}

/// reqwest implementation of the backend contract
pub struct HttpGateway {
    client: reqwest::Client,
    api_base: String,
}

impl HttpGateway {
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client construction failed: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        Self::new(config.api_base.clone())
    }

    /// GET a JSON payload, degrading to `T::default()` on any failure
    async fn get_json<T: DeserializeOwned + Default>(&self, path: &str) -> T {
        let url = format!("{}{}", self.api_base, path);
        tracing::debug!(url = %url, "GET");

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Request failed; using default payload");
                return T::default();
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "Non-success response; using default payload");
            return T::default();
        }

        match response.json::<T>().await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Response decode failed; using default payload");
                T::default()
            }
        }
    }
}

#[async_trait]
impl AnnotationStore for HttpGateway {
    async fn list_base_names(&self) -> Vec<String> {
        self.get_json("/basenames").await
    }

    async fn list_versions(&self) -> Vec<String> {
        self.get_json("/versions").await
    }

    async fn fetch_page(&self, key: &SelectionKey) -> PageData {
        if !key.is_complete() {
            tracing::debug!(key = %key, "Incomplete selection key; returning empty page");
            return PageData::default();
        }
        self.get_json(&format!("/pagedata/{}/{}", key.id, key.version))
            .await
    }

    async fn save_annotations(&self, doc: &Document) -> bool {
        if doc.annotations.is_empty() {
            tracing::info!(
                id = %doc.id,
                version = %doc.version,
                "Skipping save of empty annotation set"
            );
            return false;
        }

        let url = format!("{}/annotations/{}/{}", self.api_base, doc.id, doc.version);
        match self.client.put(&url).json(&doc.save_payload()).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(
                    id = %doc.id,
                    version = %doc.version,
                    annotation_count = doc.annotations.len(),
                    "Saved annotations"
                );
                true
            }
            Ok(response) => {
                tracing::warn!(url = %url, status = %response.status(), "Save rejected");
                false
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Save request failed");
                false
            }
        }
    }

    async fn fetch_checks(&self) -> ChecksSummary {
        self.get_json("/checks").await
    }
}

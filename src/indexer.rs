//! Search index synchronisation.
//!
//! The index itself is an external collaborator; this pipeline only pushes
//! partial updates so the indexed document's finding-aid fields track the
//! current status and transcript. Untouched fields are left as they are.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;
use serde_json::Value;
use tracing::{error, info};

use crate::error::CollaboratorError;

/// Collaborator applying merge-style partial updates to the search index.
#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait SearchIndexer: Send + Sync {
    /// Merge `payload` into the indexed document for this resource.
    async fn partial_update(
        &self,
        resource_id: i64,
        payload: Value,
    ) -> Result<(), CollaboratorError>;
}

/// Indexer backed by the search service's HTTP API.
pub struct HttpSearchIndexer {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpSearchIndexer {
    /// Construct from `SEARCH_API_BASE_URL` and `SEARCH_API_TOKEN`.
    pub fn new_from_env() -> Result<Self, CollaboratorError> {
        let base_url = std::env::var("SEARCH_API_BASE_URL")?;
        let token = std::env::var("SEARCH_API_TOKEN")?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            token,
        })
    }
}

#[async_trait]
impl SearchIndexer for HttpSearchIndexer {
    async fn partial_update(
        &self,
        resource_id: i64,
        payload: Value,
    ) -> Result<(), CollaboratorError> {
        let url = format!("{}/search/partial/{}", self.base_url, resource_id);
        info!(url = %url, "Pushing partial index update");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to decode response body>"));
            error!(status = %status, url = %url, "Partial index update rejected: {body}");
            return Err(format!("index API error ({status}): {body}").into());
        }
        Ok(())
    }
}

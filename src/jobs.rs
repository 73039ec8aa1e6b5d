//! Status lookup for finding-aid generation jobs.
//!
//! Job scheduling and execution live in an external job runner; the only
//! contract this pipeline owns is reading the status of the most recently
//! created generation job for a resource.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;
use tracing::info;

use crate::error::CollaboratorError;

/// Status codes reported by the external job runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// Read-only collaborator over the job runner's bookkeeping.
#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait JobTracker: Send + Sync {
    /// Status of the most recently created finding-aid job for the
    /// resource, or `None` when no such job exists.
    async fn latest_job_status(
        &self,
        resource_id: i64,
    ) -> Result<Option<JobStatus>, CollaboratorError>;
}

/// Tracker backed by the archival backend's job bookkeeping API.
pub struct HttpJobTracker {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpJobTracker {
    /// Construct from `ARCHIVE_API_BASE_URL` and `ARCHIVE_API_TOKEN`.
    pub fn new_from_env() -> Result<Self, CollaboratorError> {
        let base_url = std::env::var("ARCHIVE_API_BASE_URL")?;
        let token = std::env::var("ARCHIVE_API_TOKEN")?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            token,
        })
    }
}

#[async_trait]
impl JobTracker for HttpJobTracker {
    async fn latest_job_status(
        &self,
        resource_id: i64,
    ) -> Result<Option<JobStatus>, CollaboratorError> {
        let url = format!("{}/resources/{}/finding_aid_job", self.base_url, resource_id);
        info!(url = %url, "Fetching latest finding aid job");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(format!("job API error ({status}): {body}").into());
        }
        let parsed = body.trim().parse::<JobStatus>()?;
        Ok(Some(parsed))
    }
}

//! EAD export and on-disk caching.
//!
//! The export collaborator turns an archival resource into normalized EAD
//! XML; anything it raises is fatal to the whole generate operation. The
//! cache is keyed by resource and standard, and its validity is existence
//! only: a present file is returned without invoking the exporter at all.

use std::path::PathBuf;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;
use tracing::{debug, error, info};

use crate::config::GeneratorConfig;
use crate::error::{CollaboratorError, FindingAidError, Result};
use crate::resource::ArchivalResource;

/// Metadata standard the export is requested in.
pub const EXPORT_STANDARD: &str = "ead";

/// Collaborator producing EAD XML for a resource.
#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait EadExporter: Send + Sync {
    /// Export the resource and its descendants as EAD XML.
    async fn export(&self, resource: &ArchivalResource) -> Result<String, CollaboratorError>;
}

/// Cache location for a resource's export, keyed by standard and id.
pub fn cache_path(config: &GeneratorConfig, resource: &ArchivalResource) -> PathBuf {
    config
        .cache_dir
        .join(format!("{}-{}.xml", EXPORT_STANDARD, resource.id))
}

/// Deterministic fallback location used when caching is disabled.
fn fallback_path(resource: &ArchivalResource) -> PathBuf {
    std::env::temp_dir().join(format!("{}-{}.xml", EXPORT_STANDARD, resource.id))
}

/// Return the path of an EAD document for the resource, exporting only on a
/// cache miss. The exported XML is tidied before writing; the write target
/// is the cache path when caching is enabled, a deterministic fallback file
/// otherwise. A failed write is fatal.
pub async fn obtain_ead<E: EadExporter + ?Sized>(
    exporter: &E,
    resource: &ArchivalResource,
    config: &GeneratorConfig,
) -> Result<PathBuf> {
    let cached = cache_path(config, resource);
    if cached.is_file() {
        debug!(path = %cached.display(), "EAD cache hit");
        return Ok(cached);
    }

    info!(resource_id = resource.id, "Exporting EAD document");
    let xml = exporter
        .export(resource)
        .await
        .map_err(|e| FindingAidError::Export {
            resource_id: resource.id,
            message: e.to_string(),
        })?;
    let xml = tidy_xml(&xml);

    let target = if config.cache_enabled {
        cached
    } else {
        fallback_path(resource)
    };
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            error!(error = ?e, path = %parent.display(), "Failed to create EAD directory");
            FindingAidError::io(parent, e)
        })?;
    }
    std::fs::write(&target, xml.as_bytes()).map_err(|e| {
        error!(
            error = ?e,
            resource_id = resource.id,
            path = %target.display(),
            "Failed to write exported EAD"
        );
        FindingAidError::EadWrite {
            resource_id: resource.id,
            path: target.clone(),
            source: e,
        }
    })?;
    info!(path = %target.display(), cached = config.cache_enabled, "Wrote EAD document");
    Ok(target)
}

/// Normalize exporter output: drop a UTF-8 BOM and leading noise before the
/// XML declaration, normalize line endings, and end with a newline.
fn tidy_xml(xml: &str) -> String {
    let trimmed = xml.trim_start_matches('\u{feff}').trim_start();
    let mut tidied = trimmed.replace("\r\n", "\n");
    if !tidied.ends_with('\n') {
        tidied.push('\n');
    }
    tidied
}

/// Exporter backed by the archival backend's HTTP API.
pub struct HttpEadExporter {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpEadExporter {
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
impl EadExporter for HttpEadExporter {
    async fn export(&self, resource: &ArchivalResource) -> Result<String, CollaboratorError> {
        let url = format!("{}/resources/{}/ead", self.base_url, resource.id);
        info!(url = %url, "Fetching EAD export");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(status = %status, url = %url, "EAD export API returned error");
            return Err(format!("export API error ({status}): {body}").into());
        }
        Ok(body)
    }
}

//! Finding-aid lifecycle orchestration.
//!
//! Coordinates export, namespace fix-up, stylesheet materialisation, the two
//! transform stages, text extraction, property upserts and index updates for
//! one archival resource. Callers must guarantee at most one in-flight
//! operation per resource; this layer takes no locks of its own.
//!
//! Stage failures arrive as typed outcomes; propagation is decided here and
//! nowhere else. A failed generate leaves the previously persisted status
//! untouched so the last good artifact stays advertised.

use std::io::Write;
use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use serde_json::json;
use tempfile::NamedTempFile;
use tracing::{error, info};

use crate::config::GeneratorConfig;
use crate::error::{FindingAidError, Result};
use crate::export::{self, EadExporter};
use crate::extract;
use crate::indexer::SearchIndexer;
use crate::jobs::{JobStatus, JobTracker};
use crate::locator::Locator;
use crate::normalise;
use crate::properties::{
    self, PropertyStore, STATUS_GENERATED, STATUS_PROPERTY, STATUS_UPLOADED, TRANSCRIPT_PROPERTY,
    TRANSCRIPT_SCOPE,
};
use crate::resource::ArchivalResource;
use crate::runner::ProcessRunner;
use crate::stylesheet;
use crate::transform::{self, Severity, StageFailure};

/// Orchestrator for one archival resource's finding aid.
pub struct FindingAidPipeline<'a, E, R, P, S>
where
    E: EadExporter,
    R: ProcessRunner,
    P: PropertyStore,
    S: SearchIndexer,
{
    resource: ArchivalResource,
    config: &'a GeneratorConfig,
    locator: Locator,
    exporter: &'a E,
    runner: &'a R,
    properties: &'a P,
    indexer: &'a S,
}

impl<'a, E, R, P, S> FindingAidPipeline<'a, E, R, P, S>
where
    E: EadExporter,
    R: ProcessRunner,
    P: PropertyStore,
    S: SearchIndexer,
{
    /// Construct the pipeline for a resource. Rejects the root sentinel
    /// before anything touches the filesystem or a store.
    pub fn new(
        resource: ArchivalResource,
        config: &'a GeneratorConfig,
        exporter: &'a E,
        runner: &'a R,
        properties: &'a P,
        indexer: &'a S,
    ) -> Result<Self> {
        resource.ensure_not_root()?;
        let locator = Locator::new(&config.downloads_dir);
        Ok(Self {
            resource,
            config,
            locator,
            exporter,
            runner,
            properties,
            indexer,
        })
    }

    pub fn resource(&self) -> &ArchivalResource {
        &self.resource
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Render the finding aid: export (or reuse cached) EAD, fix namespaces,
    /// materialise the stylesheet, run both transform stages, then record
    /// the Generated status and push it to the search index.
    pub async fn generate(&self) -> Result<PathBuf> {
        let opts = self.config.render_options();
        info!(
            resource_id = self.resource.id,
            format = %opts.format,
            model = %opts.model,
            "[GENERATE] Starting finding aid generation"
        );

        let ead_path = export::obtain_ead(self.exporter, &self.resource, self.config).await?;
        let ead_xml =
            std::fs::read_to_string(&ead_path).map_err(|e| FindingAidError::io(&ead_path, e))?;
        let normalised = normalise::add_namespaces(&ead_xml);

        // All three intermediates are released with this call, error paths
        // included: the temp handles delete their files on drop.
        let mut normalised_ead = NamedTempFile::new().map_err(FindingAidError::TempFile)?;
        normalised_ead
            .write_all(normalised.as_bytes())
            .and_then(|_| normalised_ead.flush())
            .map_err(|e| FindingAidError::io(normalised_ead.path(), e))?;

        let rendered_stylesheet =
            stylesheet::render(&self.config.template_dir, &opts.model, &self.config.app_root)?;
        let fo_document = NamedTempFile::new().map_err(FindingAidError::TempFile)?;

        if let Err(failure) = transform::run_xslt(
            self.runner,
            &self.config.tools,
            rendered_stylesheet.path(),
            normalised_ead.path(),
            fo_document.path(),
        ) {
            return Err(self.report_stage_failure("GENERATE", failure));
        }

        std::fs::create_dir_all(&self.config.downloads_dir)
            .map_err(|e| FindingAidError::io(&self.config.downloads_dir, e))?;
        let artifact = self.locator.canonical_path(&self.resource, opts.format);

        if let Err(failure) = transform::run_fo_render(
            self.runner,
            &self.config.tools,
            opts.format,
            fo_document.path(),
            &artifact,
        ) {
            return Err(self.report_stage_failure("GENERATE", failure));
        }

        properties::upsert(
            self.properties,
            self.resource.id,
            STATUS_PROPERTY,
            None,
            STATUS_GENERATED.into(),
        )
        .await
        .map_err(FindingAidError::Store)?;

        self.indexer
            .partial_update(
                self.resource.id,
                json!({ "findingAid": { "status": STATUS_GENERATED } }),
            )
            .await
            .map_err(FindingAidError::Index)?;

        info!(
            resource_id = self.resource.id,
            artifact = %artifact.display(),
            "[GENERATE] Finding aid generated"
        );
        Ok(artifact)
    }

    /// Record an already-placed artifact as Uploaded, extract its transcript
    /// when possible, and push both to the search index. The transcript
    /// field of the index payload is explicitly null whenever extraction was
    /// skipped or failed.
    pub async fn upload(&self, artifact: &Path, mime_type: &str) -> Result<Option<String>> {
        info!(
            resource_id = self.resource.id,
            artifact = %artifact.display(),
            "[UPLOAD] Recording uploaded finding aid"
        );

        properties::upsert(
            self.properties,
            self.resource.id,
            STATUS_PROPERTY,
            None,
            STATUS_UPLOADED.into(),
        )
        .await
        .map_err(FindingAidError::Store)?;

        let transcript = if extract::extractable(mime_type) {
            extract::extract_text(self.runner, &self.config.tools, artifact)
        } else {
            info!(
                mime_type,
                "[UPLOAD] Artifact is not text-extractable; skipping transcript"
            );
            None
        };

        if let Some(text) = &transcript {
            properties::upsert(
                self.properties,
                self.resource.id,
                TRANSCRIPT_PROPERTY,
                Some(TRANSCRIPT_SCOPE),
                text.clone(),
            )
            .await
            .map_err(FindingAidError::Store)?;
        }

        self.indexer
            .partial_update(
                self.resource.id,
                json!({
                    "findingAid": {
                        "status": STATUS_UPLOADED,
                        "transcript": transcript.as_deref(),
                    }
                }),
            )
            .await
            .map_err(FindingAidError::Index)?;

        info!(
            resource_id = self.resource.id,
            transcript = transcript.is_some(),
            "[UPLOAD] Finding aid upload recorded"
        );
        Ok(transcript)
    }

    /// Remove every candidate artifact, both lifecycle properties and the
    /// indexed fields. Safe to call when nothing is present.
    pub async fn delete(&self) -> Result<()> {
        info!(
            resource_id = self.resource.id,
            "[DELETE] Removing finding aid"
        );

        for name in Locator::possible_filenames(&self.resource) {
            let candidate = self.locator.downloads_dir().join(&name);
            if candidate.exists() {
                std::fs::remove_file(&candidate)
                    .map_err(|e| FindingAidError::io(&candidate, e))?;
                info!(path = %candidate.display(), "[DELETE] Removed artifact file");
            }
        }

        let deletions = vec![
            self.properties.delete(
                self.resource.id,
                TRANSCRIPT_PROPERTY,
                Some(TRANSCRIPT_SCOPE),
            ),
            self.properties.delete(self.resource.id, STATUS_PROPERTY, None),
        ];
        try_join_all(deletions)
            .await
            .map_err(FindingAidError::Store)?;

        self.indexer
            .partial_update(
                self.resource.id,
                json!({ "findingAid": { "status": null, "transcript": null } }),
            )
            .await
            .map_err(FindingAidError::Index)?;

        info!(
            resource_id = self.resource.id,
            "[DELETE] Finding aid removed"
        );
        Ok(())
    }

    /// Status of the most recent generation job for this resource.
    pub async fn status<T: JobTracker + ?Sized>(&self, tracker: &T) -> Result<Option<JobStatus>> {
        tracker
            .latest_job_status(self.resource.id)
            .await
            .map_err(FindingAidError::Jobs)
    }

    /// Log a failed stage line by line and map its severity onto the error
    /// that leaves the pipeline. The status property is deliberately not
    /// touched on any failure path.
    fn report_stage_failure(&self, operation: &str, failure: StageFailure) -> FindingAidError {
        transform::log_stage_failure(&failure);
        error!(
            resource_id = self.resource.id,
            tool = failure.tool,
            exit_code = failure.exit_code,
            "[{operation}][ERROR] Transform stage failed"
        );
        match failure.severity {
            Severity::Fatal => FindingAidError::TransformFailed {
                tool: failure.tool,
                exit_code: failure.exit_code,
                output: failure.lines,
            },
            Severity::Soft => FindingAidError::RenderFailed { tool: failure.tool },
        }
    }
}

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::GeneratorConfig;
use crate::export::HttpEadExporter;
use crate::indexer::HttpSearchIndexer;
use crate::jobs::HttpJobTracker;
use crate::load_config::load_config;
use crate::pipeline::FindingAidPipeline;
use crate::properties::FilePropertyStore;
use crate::resource::ArchivalResource;
use crate::runner::SystemRunner;

/// CLI for finding-aid: render and manage archival finding-aid documents.
#[derive(Parser)]
#[clap(
    name = "finding-aid",
    version,
    about = "Generate, upload and manage archival finding-aid documents (EAD to PDF/RTF)"
)]
pub struct Cli {
    /// Path to the YAML config file
    #[clap(long)]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the finding aid for a resource and record it as Generated
    Generate {
        #[clap(long)]
        resource_id: i64,
        #[clap(long)]
        slug: Option<String>,
    },
    /// Record an already-placed artifact as Uploaded and extract its transcript
    Upload {
        #[clap(long)]
        resource_id: i64,
        #[clap(long)]
        slug: Option<String>,
        /// Path of the artifact the caller placed under the downloads tree
        #[clap(long)]
        artifact: PathBuf,
        /// Mime type of the artifact; derived from the configured format when omitted
        #[clap(long)]
        mime_type: Option<String>,
    },
    /// Remove the finding aid, its properties and its indexed fields
    Delete {
        #[clap(long)]
        resource_id: i64,
        #[clap(long)]
        slug: Option<String>,
    },
    /// Report the status of the most recent generation job
    Status {
        #[clap(long)]
        resource_id: i64,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_config(&cli.config)?;
    let properties = FilePropertyStore::new(config.cache_dir.join("finding-aid-properties.json"));
    let exporter = HttpEadExporter::new_from_env()
        .map_err(|e| anyhow::anyhow!("Failed to construct EAD exporter: {e}"))?;
    let indexer = HttpSearchIndexer::new_from_env()
        .map_err(|e| anyhow::anyhow!("Failed to construct search indexer: {e}"))?;
    let runner = SystemRunner;

    match cli.command {
        Commands::Generate { resource_id, slug } => {
            let pipeline = build_pipeline(
                resource_id,
                slug,
                &config,
                &exporter,
                &runner,
                &properties,
                &indexer,
            )?;
            let artifact = pipeline.generate().await?;
            println!("Finding aid generated at {}", artifact.display());
        }
        Commands::Upload {
            resource_id,
            slug,
            artifact,
            mime_type,
        } => {
            let pipeline = build_pipeline(
                resource_id,
                slug,
                &config,
                &exporter,
                &runner,
                &properties,
                &indexer,
            )?;
            let mime = mime_type
                .unwrap_or_else(|| config.resolved_format().mime_type().to_owned());
            let transcript = pipeline.upload(&artifact, &mime).await?;
            match transcript {
                Some(text) => println!("Upload recorded; transcript of {} bytes", text.len()),
                None => println!("Upload recorded; no transcript extracted"),
            }
        }
        Commands::Delete { resource_id, slug } => {
            let pipeline = build_pipeline(
                resource_id,
                slug,
                &config,
                &exporter,
                &runner,
                &properties,
                &indexer,
            )?;
            pipeline.delete().await?;
            println!("Finding aid removed for resource {resource_id}");
        }
        Commands::Status { resource_id } => {
            let tracker = HttpJobTracker::new_from_env()
                .map_err(|e| anyhow::anyhow!("Failed to construct job tracker: {e}"))?;
            let pipeline = build_pipeline(
                resource_id,
                None,
                &config,
                &exporter,
                &runner,
                &properties,
                &indexer,
            )?;
            match pipeline.status(&tracker).await? {
                Some(status) => println!("Latest generation job: {status}"),
                None => println!("No generation job found for resource {resource_id}"),
            }
        }
    }

    Ok(())
}

fn build_pipeline<'a>(
    resource_id: i64,
    slug: Option<String>,
    config: &'a GeneratorConfig,
    exporter: &'a HttpEadExporter,
    runner: &'a SystemRunner,
    properties: &'a FilePropertyStore,
    indexer: &'a HttpSearchIndexer,
) -> Result<FindingAidPipeline<'a, HttpEadExporter, SystemRunner, FilePropertyStore, HttpSearchIndexer>>
{
    let resource = ArchivalResource::new(resource_id, slug);
    resource.trace_loaded();
    FindingAidPipeline::new(resource, config, exporter, runner, properties, indexer)
        .map_err(Into::into)
}

//! Configuration loading.
//!
//! The static YAML file holds directories, tool commands and render
//! settings; the render settings can additionally be overridden per run via
//! `FINDING_AID_FORMAT` and `FINDING_AID_MODEL`. Secrets (API endpoints and
//! tokens) never live in the file; the HTTP collaborators read them from the
//! environment themselves.

use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::{error, info};

use crate::config::{GeneratorConfig, OutputFormat};

/// Loads the YAML config file and applies environment overrides. Returns a
/// fully merged [`GeneratorConfig`] or an error.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GeneratorConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: GeneratorConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Ok(format) = std::env::var("FINDING_AID_FORMAT") {
        match format.parse::<OutputFormat>() {
            Ok(parsed) => {
                info!(format = %parsed, "FINDING_AID_FORMAT override applied");
                config.format = Some(parsed);
            }
            Err(e) => {
                error!(format = %format, "Invalid FINDING_AID_FORMAT");
                anyhow::bail!(e);
            }
        }
    }

    if let Ok(model) = std::env::var("FINDING_AID_MODEL") {
        info!(model = %model, "FINDING_AID_MODEL override applied");
        config.model = Some(model);
    }

    config.trace_loaded();
    Ok(config)
}

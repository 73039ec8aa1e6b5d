//! Pipeline configuration.
//!
//! All directories, the caching flag and the two render settings live here.
//! The settings (`format`, `model`) are optional in the file and resolved
//! once per top-level call into a [`RenderOptions`] value that is threaded
//! through the pipeline, instead of being looked up again in every stage.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Stylesheet selector used when the config does not name one.
pub const DEFAULT_MODEL: &str = "inventory-summary";

/// Output format of the rendered finding aid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pdf,
    Rtf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Rtf => "rtf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Rtf => "application/rtf",
        }
    }

    /// Format flag handed to the FO renderer as its first argument.
    pub fn render_flag(self) -> String {
        format!("-{}", self.extension())
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(OutputFormat::Pdf),
            "rtf" => Ok(OutputFormat::Rtf),
            other => Err(format!("unsupported finding aid format: {other}")),
        }
    }
}

/// External tool commands, overridable per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCommands {
    #[serde(default = "default_xslt_processor")]
    pub xslt_processor: String,
    #[serde(default = "default_fo_renderer")]
    pub fo_renderer: String,
    #[serde(default = "default_text_extractor")]
    pub text_extractor: String,
}

impl Default for ToolCommands {
    fn default() -> Self {
        Self {
            xslt_processor: default_xslt_processor(),
            fo_renderer: default_fo_renderer(),
            text_extractor: default_text_extractor(),
        }
    }
}

fn default_xslt_processor() -> String {
    "saxon".into()
}
fn default_fo_renderer() -> String {
    "fop".into()
}
fn default_text_extractor() -> String {
    "pdftotext".into()
}

/// Top-level generator configuration, deserialized from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Public downloads tree where rendered artifacts land.
    pub downloads_dir: PathBuf,
    /// Where exported EAD documents are cached.
    pub cache_dir: PathBuf,
    /// Directory holding the `ead-pdf-{model}.xsl` stylesheets.
    pub template_dir: PathBuf,
    /// Persist exported EAD at the cache path only when enabled.
    #[serde(default)]
    pub cache_enabled: bool,
    /// Value substituted for the application-root token in stylesheets.
    #[serde(default = "default_app_root")]
    pub app_root: String,
    #[serde(default)]
    pub format: Option<OutputFormat>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: ToolCommands,
}

fn default_app_root() -> String {
    ".".into()
}

/// Render settings resolved once per top-level call (format + stylesheet
/// model), threaded explicitly through the pipeline stages.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub model: String,
    pub format: OutputFormat,
}

impl GeneratorConfig {
    /// Named setting value, or `pdf`.
    pub fn resolved_format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    /// Named setting value, or the default stylesheet model.
    pub fn resolved_model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            model: self.resolved_model().to_owned(),
            format: self.resolved_format(),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            downloads_dir = %self.downloads_dir.display(),
            cache_dir = %self.cache_dir.display(),
            template_dir = %self.template_dir.display(),
            cache_enabled = self.cache_enabled,
            format = %self.resolved_format(),
            model = self.resolved_model(),
            "Loaded generator config"
        );
        debug!(?self, "Generator config (full debug)");
    }
}

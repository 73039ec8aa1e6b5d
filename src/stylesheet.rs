//! XSL stylesheet materialisation.
//!
//! Stylesheets ship with an application-root placeholder so image and asset
//! references resolve wherever the application is installed. Each render
//! call loads `ead-pdf-{model}.xsl`, substitutes every occurrence of the
//! token and writes the result to a fresh temporary file. The returned
//! handle owns the file: dropping it removes it, on success and error paths
//! alike.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{FindingAidError, Result};

/// Token substituted with the configured application root.
pub const APP_ROOT_TOKEN: &str = "{{app-root}}";

/// Stylesheet filename for a given model.
pub fn stylesheet_filename(model: &str) -> String {
    format!("ead-pdf-{model}.xsl")
}

/// Load the stylesheet for `model`, substitute the application-root token
/// and write the result to a new temporary file.
pub fn render(template_dir: &Path, model: &str, app_root: &str) -> Result<NamedTempFile> {
    let source = template_dir.join(stylesheet_filename(model));
    let content = std::fs::read_to_string(&source).map_err(|e| FindingAidError::Stylesheet {
        path: source.clone(),
        source: e,
    })?;

    let occurrences = content.matches(APP_ROOT_TOKEN).count();
    let substituted = content.replace(APP_ROOT_TOKEN, app_root);
    debug!(
        stylesheet = %source.display(),
        occurrences,
        "Substituted application root into stylesheet"
    );

    let mut rendered = NamedTempFile::new().map_err(FindingAidError::TempFile)?;
    rendered
        .write_all(substituted.as_bytes())
        .and_then(|_| rendered.flush())
        .map_err(|e| FindingAidError::io(rendered.path(), e))?;
    Ok(rendered)
}

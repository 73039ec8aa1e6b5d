//! Text transcript extraction from a rendered finding aid.
//!
//! Extraction is strictly best-effort: an artifact whose mime type the
//! extractor cannot handle is skipped with a note, and a failing extractor
//! run is logged and skipped without failing the enclosing upload. Only a
//! successful run with non-empty output yields a transcript.

use std::path::Path;

use tracing::{error, info};

use crate::config::ToolCommands;
use crate::runner::ProcessRunner;

/// Tool tag used in extraction failure log prefixes.
pub const EXTRACT_TOOL: &str = "PDFTOTEXT";

/// Upper bound on the persisted transcript, in bytes.
pub const MAX_TRANSCRIPT_BYTES: usize = 65535;

const LINE_SEPARATOR: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Whether the extractor can handle an artifact of this mime type.
pub fn extractable(mime_type: &str) -> bool {
    mime_type == "application/pdf"
}

/// Run the text extractor over the artifact. Returns the truncated
/// transcript, or `None` when the run failed or produced nothing.
pub fn extract_text(
    runner: &dyn ProcessRunner,
    tools: &ToolCommands,
    artifact: &Path,
) -> Option<String> {
    let args = vec![artifact.display().to_string()];
    match runner.run(&tools.text_extractor, &args) {
        Ok(output) if output.success() => {
            let joined = output.stdout_lines.join(LINE_SEPARATOR);
            if joined.is_empty() {
                info!(
                    artifact = %artifact.display(),
                    "Extractor produced no text; skipping transcript"
                );
                return None;
            }
            Some(truncate_to_limit(joined, MAX_TRANSCRIPT_BYTES))
        }
        Ok(output) => {
            for line in output.captured_lines() {
                error!("ERROR({EXTRACT_TOOL}): {line}");
            }
            info!(
                artifact = %artifact.display(),
                exit_code = output.exit_code,
                "Text extraction failed; transcript skipped"
            );
            None
        }
        Err(e) => {
            error!(
                error = ?e,
                artifact = %artifact.display(),
                "Failed to launch text extractor; transcript skipped"
            );
            None
        }
    }
}

/// Truncate to at most `limit` bytes without splitting a UTF-8 character.
fn truncate_to_limit(mut text: String, limit: usize) -> String {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    text
}

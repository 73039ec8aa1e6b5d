//! Error types for the finding-aid pipeline.
//!
//! The library surfaces a single [`FindingAidError`] enum via `thiserror`.
//! Collaborator traits (exporter, property store, indexer, job tracker) keep
//! boxed error objects at the seam and are wrapped into the variants below
//! at the pipeline boundary. The CLI wraps everything with `anyhow`.

use std::path::PathBuf;

/// Boxed error type used at every collaborator trait seam.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error type for all finding-aid operations.
#[derive(Debug, thiserror::Error)]
pub enum FindingAidError {
    /// The root archival resource cannot carry a finding aid.
    #[error("the root resource (id {0}) cannot have a finding aid")]
    RootResource(i64),

    /// EAD export collaborator failed. Fatal to the whole generate().
    #[error("EAD export failed for resource {resource_id}: {message}")]
    Export { resource_id: i64, message: String },

    /// Writing the exported EAD document to disk failed.
    #[error("failed to write EAD for resource {resource_id} at {path:?}: {source}")]
    EadWrite {
        resource_id: i64,
        path: PathBuf,
        source: std::io::Error,
    },

    /// Stylesheet file could not be loaded from the template directory.
    #[error("stylesheet {path:?} could not be loaded: {source}")]
    Stylesheet {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Temporary file allocation failed; the operation aborts.
    #[error("temporary file allocation failed: {0}")]
    TempFile(std::io::Error),

    /// Filesystem I/O failure at a known path.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A transform stage exited non-zero with fatal severity. Carries the
    /// captured tool output, line by line.
    #[error("{tool} transform failed with exit code {exit_code}")]
    TransformFailed {
        tool: &'static str,
        exit_code: i32,
        output: Vec<String>,
    },

    /// A transform stage failed softly: the output was already logged and is
    /// not carried on the error.
    #[error("{tool} rendering failed")]
    RenderFailed { tool: &'static str },

    /// Property store collaborator failed.
    #[error("property store error: {0}")]
    Store(CollaboratorError),

    /// Search index collaborator failed.
    #[error("search index error: {0}")]
    Index(CollaboratorError),

    /// Job tracker collaborator failed.
    #[error("job tracker error: {0}")]
    Jobs(CollaboratorError),
}

/// Convenience alias used throughout the crate. The error parameter can be
/// overridden at collaborator seams that keep boxed errors.
pub type Result<T, E = FindingAidError> = std::result::Result<T, E>;

impl FindingAidError {
    /// Wrap a `std::io::Error` with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = FindingAidError::RootResource(1);
        assert_eq!(
            err.to_string(),
            "the root resource (id 1) cannot have a finding aid"
        );

        let err = FindingAidError::Export {
            resource_id: 42,
            message: "backend unreachable".into(),
        };
        assert!(err.to_string().contains("resource 42"));

        let err = FindingAidError::RenderFailed { tool: "FOP" };
        assert_eq!(err.to_string(), "FOP rendering failed");
    }
}

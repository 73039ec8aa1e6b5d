//! Path and filename computation for rendered finding aids.
//!
//! Every other component asks the locator where artifacts live. The active
//! format may have changed since an artifact was written, so deletion and
//! download lookups always consider both extensions for both the id-based
//! and the slug-based name.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::OutputFormat;
use crate::resource::ArchivalResource;

/// Computes artifact locations under the public downloads directory.
#[derive(Debug, Clone)]
pub struct Locator {
    downloads_dir: PathBuf,
}

impl Locator {
    pub fn new(downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloads_dir: downloads_dir.into(),
        }
    }

    pub fn downloads_dir(&self) -> &Path {
        &self.downloads_dir
    }

    /// Ordered candidate filenames for a resource: the id-based pair first,
    /// then the slug-based pair when a slug exists.
    pub fn possible_filenames(resource: &ArchivalResource) -> Vec<String> {
        let mut names = vec![
            format!("{}.{}", resource.id, OutputFormat::Pdf.extension()),
            format!("{}.{}", resource.id, OutputFormat::Rtf.extension()),
        ];
        if let Some(slug) = resource.slug.as_deref() {
            names.push(format!("{}.{}", slug, OutputFormat::Pdf.extension()));
            names.push(format!("{}.{}", slug, OutputFormat::Rtf.extension()));
        }
        names
    }

    /// First existing candidate under the downloads directory, if any.
    pub fn path_for_download(&self, resource: &ArchivalResource) -> Option<PathBuf> {
        for name in Self::possible_filenames(resource) {
            let candidate = self.downloads_dir.join(&name);
            if candidate.is_file() {
                debug!(path = %candidate.display(), "Found existing finding aid");
                return Some(candidate);
            }
        }
        None
    }

    /// Canonical artifact path for a fresh render: slug wins over id.
    pub fn canonical_path(&self, resource: &ArchivalResource, format: OutputFormat) -> PathBuf {
        let stem = resource
            .slug
            .clone()
            .unwrap_or_else(|| resource.id.to_string());
        self.downloads_dir
            .join(format!("{}.{}", stem, format.extension()))
    }
}

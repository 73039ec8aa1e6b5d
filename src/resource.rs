use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FindingAidError, Result};

/// Identifier of the sentinel root node of the archival hierarchy. The root
/// has no description of its own and can never carry a finding aid.
pub const ROOT_RESOURCE_ID: i64 = 1;

/// A hierarchical archival description record, as far as this pipeline needs
/// to know it. The full tree model lives with the archival backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivalResource {
    pub id: i64,
    /// URL-friendly identifier, preferred over the numeric id when naming
    /// the rendered artifact.
    pub slug: Option<String>,
}

impl ArchivalResource {
    pub fn new(id: i64, slug: Option<String>) -> Self {
        Self { id, slug }
    }

    /// Precondition shared by every pipeline construction: the root sentinel
    /// is rejected before any filesystem or store access happens.
    pub fn ensure_not_root(&self) -> Result<()> {
        if self.id == ROOT_RESOURCE_ID {
            return Err(FindingAidError::RootResource(self.id));
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            resource_id = self.id,
            slug = self.slug.as_deref().unwrap_or("<none>"),
            "Loaded archival resource"
        );
    }
}

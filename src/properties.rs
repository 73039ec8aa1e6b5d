//! Named, locale-tagged properties attached to archival resources.
//!
//! Two well-known names exist: `findingAidStatus` and
//! `findingAidTranscript`, the latter carrying a fixed provenance scope that
//! distinguishes it from status. The store behind them is a collaborator;
//! this module supplies the trait, a memory-backed store for tests and
//! embedding, a JSON-file-backed store for the CLI, and the single upsert
//! routine used by every lifecycle transition.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::CollaboratorError;

/// Property holding the lifecycle status ("Generated" or "Uploaded").
pub const STATUS_PROPERTY: &str = "findingAidStatus";
/// Property holding the extracted transcript.
pub const TRANSCRIPT_PROPERTY: &str = "findingAidTranscript";
/// Provenance scope recorded on transcript properties.
pub const TRANSCRIPT_SCOPE: &str = "Text extracted from the rendered finding aid";
/// Locale tag written on all properties this pipeline creates.
pub const PROPERTY_LOCALE: &str = "en";

/// Lifecycle status values persisted in the status property.
pub const STATUS_GENERATED: &str = "Generated";
pub const STATUS_UPLOADED: &str = "Uploaded";

/// A named key/value property attached to one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub object_id: i64,
    pub name: String,
    pub scope: Option<String>,
    pub value: String,
    pub locale: String,
}

impl Property {
    fn matches(&self, object_id: i64, name: &str, scope: Option<&str>) -> bool {
        self.object_id == object_id && self.name == name && self.scope.as_deref() == scope
    }
}

/// Persistence collaborator for resource properties.
#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Look up a property by its (object, name, scope) key.
    async fn find<'a>(
        &self,
        object_id: i64,
        name: &'a str,
        scope: Option<&'a str>,
    ) -> Result<Option<Property>, CollaboratorError>;

    /// Insert the property, or replace the existing one with the same key.
    async fn save(&self, property: Property) -> Result<(), CollaboratorError>;

    /// Remove the property with this key. Removing an absent property is
    /// not an error.
    async fn delete<'a>(
        &self,
        object_id: i64,
        name: &'a str,
        scope: Option<&'a str>,
    ) -> Result<(), CollaboratorError>;
}

/// Lookup-or-create upsert shared by every lifecycle transition: mutates the
/// existing property in place, never duplicates the key.
pub async fn upsert<S: PropertyStore + ?Sized>(
    store: &S,
    object_id: i64,
    name: &str,
    scope: Option<&str>,
    value: String,
) -> Result<(), CollaboratorError> {
    let property = match store.find(object_id, name, scope).await? {
        Some(mut existing) => {
            debug!(object_id, name, "Updating existing property");
            existing.value = value;
            existing
        }
        None => {
            debug!(object_id, name, "Creating property");
            Property {
                object_id,
                name: name.to_owned(),
                scope: scope.map(str::to_owned),
                value,
                locale: PROPERTY_LOCALE.to_owned(),
            }
        }
    };
    store.save(property).await
}

/// In-memory store used by tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryPropertyStore {
    entries: Mutex<Vec<Property>>,
}

impl MemoryPropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored properties, for assertions.
    pub fn all(&self) -> Vec<Property> {
        self.entries.lock().expect("property store poisoned").clone()
    }

    pub fn get(&self, object_id: i64, name: &str, scope: Option<&str>) -> Option<Property> {
        self.entries
            .lock()
            .expect("property store poisoned")
            .iter()
            .find(|p| p.matches(object_id, name, scope))
            .cloned()
    }
}

#[async_trait]
impl PropertyStore for MemoryPropertyStore {
    async fn find<'a>(
        &self,
        object_id: i64,
        name: &'a str,
        scope: Option<&'a str>,
    ) -> Result<Option<Property>, CollaboratorError> {
        Ok(self.get(object_id, name, scope))
    }

    async fn save(&self, property: Property) -> Result<(), CollaboratorError> {
        let mut entries = self.entries.lock().expect("property store poisoned");
        match entries
            .iter_mut()
            .find(|p| p.matches(property.object_id, &property.name, property.scope.as_deref()))
        {
            Some(existing) => *existing = property,
            None => entries.push(property),
        }
        Ok(())
    }

    async fn delete<'a>(
        &self,
        object_id: i64,
        name: &'a str,
        scope: Option<&'a str>,
    ) -> Result<(), CollaboratorError> {
        self.entries
            .lock()
            .expect("property store poisoned")
            .retain(|p| !p.matches(object_id, name, scope));
        Ok(())
    }
}

/// JSON-document-backed store for standalone CLI runs: the whole property
/// set is one serde_json file, rewritten on every mutation.
#[derive(Debug)]
pub struct FilePropertyStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilePropertyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!(path = %path.display(), "Using file-backed property store");
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Vec<Property>, CollaboratorError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| format!("failed to read {}: {e}", self.path.display()))?;
        let entries: Vec<Property> = serde_json::from_str(&content)
            .map_err(|e| format!("failed to parse {}: {e}", self.path.display()))?;
        Ok(entries)
    }

    fn persist(&self, entries: &[Property]) -> Result<(), CollaboratorError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json)
            .map_err(|e| format!("failed to write {}: {e}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl PropertyStore for FilePropertyStore {
    async fn find<'a>(
        &self,
        object_id: i64,
        name: &'a str,
        scope: Option<&'a str>,
    ) -> Result<Option<Property>, CollaboratorError> {
        let _guard = self.lock.lock().expect("property file poisoned");
        Ok(self
            .load()?
            .into_iter()
            .find(|p| p.matches(object_id, name, scope)))
    }

    async fn save(&self, property: Property) -> Result<(), CollaboratorError> {
        let _guard = self.lock.lock().expect("property file poisoned");
        let mut entries = self.load()?;
        match entries
            .iter_mut()
            .find(|p| p.matches(property.object_id, &property.name, property.scope.as_deref()))
        {
            Some(existing) => *existing = property,
            None => entries.push(property),
        }
        self.persist(&entries)
    }

    async fn delete<'a>(
        &self,
        object_id: i64,
        name: &'a str,
        scope: Option<&'a str>,
    ) -> Result<(), CollaboratorError> {
        let _guard = self.lock.lock().expect("property file poisoned");
        let mut entries = self.load()?;
        entries.retain(|p| !p.matches(object_id, name, scope));
        self.persist(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_creates_then_mutates_in_place() {
        let store = MemoryPropertyStore::new();

        upsert(&store, 42, STATUS_PROPERTY, None, STATUS_GENERATED.into())
            .await
            .unwrap();
        upsert(&store, 42, STATUS_PROPERTY, None, STATUS_UPLOADED.into())
            .await
            .unwrap();

        let all = store.all();
        assert_eq!(all.len(), 1, "upsert must never duplicate the key");
        assert_eq!(all[0].value, STATUS_UPLOADED);
        assert_eq!(all[0].locale, PROPERTY_LOCALE);
    }

    #[tokio::test]
    async fn scope_is_part_of_the_key() {
        let store = MemoryPropertyStore::new();

        upsert(&store, 42, TRANSCRIPT_PROPERTY, Some(TRANSCRIPT_SCOPE), "text".into())
            .await
            .unwrap();
        upsert(&store, 42, TRANSCRIPT_PROPERTY, None, "other".into())
            .await
            .unwrap();

        assert_eq!(store.all().len(), 2);
        assert_eq!(
            store
                .get(42, TRANSCRIPT_PROPERTY, Some(TRANSCRIPT_SCOPE))
                .unwrap()
                .value,
            "text"
        );
    }

    #[tokio::test]
    async fn deleting_an_absent_property_is_not_an_error() {
        let store = MemoryPropertyStore::new();
        store.delete(42, STATUS_PROPERTY, None).await.unwrap();
        store.delete(42, STATUS_PROPERTY, None).await.unwrap();
    }

    #[tokio::test]
    async fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePropertyStore::new(dir.path().join("properties.json"));

        upsert(&store, 7, STATUS_PROPERTY, None, STATUS_GENERATED.into())
            .await
            .unwrap();
        assert_eq!(
            store
                .find(7, STATUS_PROPERTY, None)
                .await
                .unwrap()
                .unwrap()
                .value,
            STATUS_GENERATED
        );

        store.delete(7, STATUS_PROPERTY, None).await.unwrap();
        assert!(store.find(7, STATUS_PROPERTY, None).await.unwrap().is_none());
    }
}

//! `NAME_ID.vf.json`: maps root-item-id keys to entity metadata. The queue
//! never owns it; it only reads keys for cross-reference checks.

use crate::error::{QueueError, Result};
use crate::paths;
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    entries: Map<String, Value>,
}

impl NameRegistry {
    /// Load the registry next to a queue document. `Ok(None)` if there is none.
    pub fn load(dir: &Path) -> Result<Option<Self>> {
        let path = paths::name_registry_path(dir);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value: Value = serde_json::from_str(&data).map_err(|source| QueueError::Parse {
            path: path.clone(),
            source,
        })?;
        let entries = match value {
            Value::Object(map) => map,
            _ => return Err(QueueError::UnknownFormat(path)),
        };
        Ok(Some(Self { entries }))
    }

    /// Write an empty `{}` registry if none exists. Returns true if created.
    pub fn initialize(dir: &Path) -> Result<bool> {
        crate::io::write_if_missing(&paths::name_registry_path(dir), b"{}\n")
    }

    pub fn contains(&self, root_item_id: &str) -> bool {
        self.entries.contains_key(root_item_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_registry_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(NameRegistry::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn initialize_creates_empty_object_once() {
        let dir = TempDir::new().unwrap();
        assert!(NameRegistry::initialize(dir.path()).unwrap());
        assert!(!NameRegistry::initialize(dir.path()).unwrap());
        let reg = NameRegistry::load(dir.path()).unwrap().unwrap();
        assert!(reg.is_empty());
    }

    #[test]
    fn contains_checks_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("NAME_ID.vf.json"),
            r#"{"infra_epic__feature__logs": {"type": "feature", "name": "logs"}}"#,
        )
        .unwrap();
        let reg = NameRegistry::load(dir.path()).unwrap().unwrap();
        assert_eq!(reg.len(), 1);
        assert!(reg.contains("infra_epic__feature__logs"));
        assert!(!reg.contains("infra_epic__feature__metrics"));
    }

    #[test]
    fn non_object_registry_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("NAME_ID.vf.json"), "[]").unwrap();
        assert!(NameRegistry::load(dir.path()).is_err());
    }
}

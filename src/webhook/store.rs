use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::{ConnectorError, Result};
use crate::models::WebhookRegistration;

/// Host-owned storage for the active webhook registration.
pub trait WebhookStateStore: Send + Sync {
    fn load(&self) -> Result<Option<WebhookRegistration>>;
    fn save(&self, registration: &WebhookRegistration) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStateStore {
    registration: Mutex<Option<WebhookRegistration>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registration(registration: WebhookRegistration) -> Self {
        Self {
            registration: Mutex::new(Some(registration)),
        }
    }
}

impl WebhookStateStore for MemoryStateStore {
    fn load(&self) -> Result<Option<WebhookRegistration>> {
        Ok(self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, registration: &WebhookRegistration) -> Result<()> {
        *self
            .registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(registration.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

/// Registration persisted as a JSON document, for CLI hosts that outlive one process.
#[derive(Debug, Clone)]
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/helpscout-connector/webhook.json`.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("webhook.json"))
            .ok_or_else(|| ConnectorError::State("could not resolve config directory".to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WebhookStateStore for JsonFileStateStore {
    fn load(&self) -> Result<Option<WebhookRegistration>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path).map_err(|error| {
            ConnectorError::State(format!("read {}: {error}", self.path.display()))
        })?;
        let registration = serde_json::from_str(&raw).map_err(|error| {
            ConnectorError::State(format!("parse {}: {error}", self.path.display()))
        })?;
        Ok(Some(registration))
    }

    fn save(&self, registration: &WebhookRegistration) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                ConnectorError::State(format!("create {}: {error}", parent.display()))
            })?;
        }

        let raw = serde_json::to_string_pretty(registration)?;
        fs::write(&self.path, raw).map_err(|error| {
            ConnectorError::State(format!("write {}: {error}", self.path.display()))
        })
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(ConnectorError::State(format!(
                "remove {}: {error}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonFileStateStore, MemoryStateStore, WebhookStateStore};
    use crate::models::WebhookRegistration;

    fn registration() -> WebhookRegistration {
        WebhookRegistration {
            webhook_id: Some(77),
            target_url: "https://hooks.example.test/in".to_string(),
            secret: Some("abc".to_string()),
            events: vec!["convo.created".to_string()],
            payload_version: "v2".to_string(),
            label: None,
        }
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStateStore::new();
        assert_eq!(store.load().expect("load empty"), None);

        store.save(&registration()).expect("save");
        assert_eq!(store.load().expect("load"), Some(registration()));

        store.clear().expect("clear");
        assert_eq!(store.load().expect("load cleared"), None);
    }

    #[test]
    fn file_store_persists_and_clears() {
        let path = std::env::temp_dir()
            .join(format!("helpscout-state-{}", uuid::Uuid::new_v4()))
            .join("webhook.json");
        let store = JsonFileStateStore::new(&path);
        assert_eq!(store.load().expect("load missing"), None);

        store.save(&registration()).expect("save");
        let reopened = JsonFileStateStore::new(&path);
        assert_eq!(reopened.load().expect("reload"), Some(registration()));

        reopened.clear().expect("clear");
        reopened.clear().expect("clear twice");
        assert!(!path.exists());

        if let Some(parent) = path.parent() {
            let _ = std::fs::remove_dir_all(parent);
        }
    }
}

//! Async key-value store holding JSON values.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use litechat_core::{Error, Result};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Persisted store scoped to one install.
///
/// A read failure is an error, never an absent key: callers must be able to
/// tell "nothing stored" from "could not look".
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

/// All keys in one JSON object on disk.
///
/// Every operation re-reads the file so that separate invocations of the
/// binary see each other's writes. Writes go to a sibling temp file and are
/// renamed into place.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(unavailable(&self.path, "read", e)),
        };
        if data.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&data) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(Error::StoreUnavailable(format!(
                "{}: expected a JSON object, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
            Err(e) => Err(unavailable(&self.path, "parse", e)),
        }
    }

    async fn save(&self, entries: &Map<String, Value>) -> Result<()> {
        let data = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| unavailable(parent, "create", e))?;
        }
        if let Err(e) = tokio::fs::write(&tmp, data).await {
            discard_temp(&tmp).await;
            return Err(unavailable(&tmp, "write", e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            warn!("Failed to move store file into place: {}", e);
            discard_temp(&tmp).await;
            return Err(unavailable(&self.path, "write", e));
        }
        debug!(path = %self.path.display(), keys = entries.len(), "store saved");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.load().await?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);
        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

async fn discard_temp(tmp: &Path) {
    if let Err(e) = tokio::fs::remove_file(tmp).await {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", tmp.display(), e);
        }
    }
}

fn unavailable(path: &Path, action: &str, err: impl std::fmt::Display) -> Error {
    Error::StoreUnavailable(format!("{} {}: {}", action, path.display(), err))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

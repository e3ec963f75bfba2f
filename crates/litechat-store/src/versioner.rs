//! "Part N" title versioning.
//!
//! The highest version issued per base title lives in the store under
//! [`TITLE_INDEX_KEY`]. Only this module reads or writes that key.
//!
//! Calls sharing one `TitleVersioner` are serialized. Two processes writing
//! the same store can still both issue the same version for a base.

use std::collections::BTreeMap;
use std::sync::Arc;

use litechat_core::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::kv::KeyValueStore;

/// Store key of the persisted title index.
pub const TITLE_INDEX_KEY: &str = "chatTitleIndex";
/// Base used for an empty title.
pub const UNTITLED_BASE: &str = "Untitled Chat";
/// Separator written between base and version.
pub const PART_SEPARATOR: &str = " – Part ";

static VERSION_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.*?)\s*[–—-]\s*Part\s+(\d+)\s*$").unwrap());

/// Highest issued version per base title.
pub type TitleIndex = BTreeMap<String, u32>;

/// A title split into its base and version suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRecord {
    pub base: String,
    /// 0 when the title carries no suffix.
    pub version: u32,
}

/// Read-only view of where a title stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub base: String,
    #[serde(rename = "currentVersion")]
    pub current_version: u32,
    #[serde(rename = "nextVersion")]
    pub next_version: u32,
}

/// Split a title into base and "Part N" suffix.
///
/// Any of `-`, `–`, `—` is accepted as the dash. A suffix whose number does
/// not fit a `u32` is treated as part of the base.
pub fn parse_title(title: &str) -> TitleRecord {
    let trimmed = title.trim();
    if let Some(caps) = VERSION_SUFFIX_RE.captures(trimmed) {
        let base = caps[1].trim();
        if let Ok(version) = caps[2].parse::<u32>() {
            return TitleRecord {
                base: if base.is_empty() { UNTITLED_BASE } else { base }.to_string(),
                version,
            };
        }
    }
    TitleRecord {
        base: if trimmed.is_empty() { UNTITLED_BASE } else { trimmed }.to_string(),
        version: 0,
    }
}

pub fn format_versioned(base: &str, version: u32) -> String {
    format!("{}{}{}", base, PART_SEPARATOR, version)
}

/// Issues monotonically increasing versions per base title.
pub struct TitleVersioner {
    store: Arc<dyn KeyValueStore>,
    lock: tokio::sync::Mutex<()>,
}

impl TitleVersioner {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Issue the next versioned title for `current_title`.
    ///
    /// An explicit suffix wins over the stored counter. The new version is
    /// persisted before the title is returned; a failed write is an error.
    pub async fn next_version(&self, current_title: &str) -> Result<String> {
        let _guard = self.lock.lock().await;
        let parsed = parse_title(current_title);
        let mut index = self.load_index().await?;

        let next = if parsed.version > 0 {
            parsed.version.saturating_add(1)
        } else {
            index
                .get(&parsed.base)
                .copied()
                .unwrap_or(0)
                .saturating_add(1)
        };

        index.insert(parsed.base.clone(), next);
        self.save_index(&index).await?;

        info!(base = %parsed.base, version = next, "issued title version");
        Ok(format_versioned(&parsed.base, next))
    }

    /// Where `title` stands, without touching the index.
    pub async fn version_info(&self, title: &str) -> Result<VersionInfo> {
        let parsed = parse_title(title);
        let stored = self
            .load_index()
            .await?
            .get(&parsed.base)
            .copied()
            .unwrap_or(0);
        let current = parsed.version.max(stored);
        Ok(VersionInfo {
            base: parsed.base,
            current_version: current,
            next_version: current.saturating_add(1),
        })
    }

    /// Overwrite the stored version for `base`.
    pub async fn update_index(&self, base: &str, version: u32) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut index = self.load_index().await?;
        index.insert(base.trim().to_string(), version);
        self.save_index(&index).await?;
        debug!(base, version, "title index updated");
        Ok(())
    }

    /// Record a title that already carries a suffix, e.g. after a manual
    /// rename. Returns the parsed record, or `None` for an unversioned title.
    pub async fn record_versioned_title(&self, title: &str) -> Result<Option<TitleRecord>> {
        let parsed = parse_title(title);
        if parsed.version == 0 {
            return Ok(None);
        }
        self.update_index(&parsed.base, parsed.version).await?;
        Ok(Some(parsed))
    }

    pub async fn reset_index(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.store.remove(TITLE_INDEX_KEY).await?;
        info!("title index reset");
        Ok(())
    }

    pub async fn all_versions(&self) -> Result<TitleIndex> {
        self.load_index().await
    }

    async fn load_index(&self) -> Result<TitleIndex> {
        match self.store.get(TITLE_INDEX_KEY).await? {
            None | Some(serde_json::Value::Null) => Ok(TitleIndex::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                Error::StoreUnavailable(format!("malformed {}: {}", TITLE_INDEX_KEY, e))
            }),
        }
    }

    async fn save_index(&self, index: &TitleIndex) -> Result<()> {
        self.store
            .set(TITLE_INDEX_KEY, serde_json::to_value(index)?)
            .await
    }
}

//! Runtime types.

use chrono::{DateTime, Duration, Utc};
use litechat_dom::ChainKind;
use serde::{Deserialize, Serialize};

/// Store key holding the handoff awaiting delivery.
pub const PENDING_KEY: &str = "pendingInjection";
/// Store key holding the user's message window setting.
pub const MESSAGE_COUNT_KEY: &str = "messageCount";
/// Handoffs older than this are discarded.
pub const PENDING_TTL_SECS: i64 = 5 * 60;

/// Carry-over produced from one conversation, waiting to be delivered into
/// a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handoff {
    pub id: String,
    /// Rendered payload to paste into the new conversation.
    #[serde(rename = "contextSummary")]
    pub context_summary: String,
    #[serde(rename = "versionedTitle")]
    pub versioned_title: String,
    #[serde(rename = "originalTitle")]
    pub original_title: String,
    #[serde(rename = "messageCount")]
    pub message_count: usize,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Handoff {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.age(now) > Duration::seconds(PENDING_TTL_SECS)
    }
}

/// Outcome of resolving one chain against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainCheck {
    pub chain: String,
    pub found: bool,
    /// Descriptor that matched, if any.
    pub rule: Option<String>,
    /// Elements the matching descriptor selected.
    pub count: usize,
}

/// Which page chains resolve against a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SelectorReport {
    /// One entry per page chain, in validation order.
    pub checks: Vec<ChainCheck>,
    #[serde(rename = "checkedAt")]
    pub checked_at: DateTime<Utc>,
}

impl SelectorReport {
    pub fn all_found(&self) -> bool {
        self.checks.iter().all(|c| c.found)
    }

    pub fn check(&self, kind: ChainKind) -> Option<&ChainCheck> {
        self.checks.iter().find(|c| c.chain == kind.name())
    }
}

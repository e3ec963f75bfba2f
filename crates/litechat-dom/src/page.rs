//! Page snapshot sources and the bounded wait for late-appearing elements.

use std::path::{Path, PathBuf};
use std::time::Duration;

use litechat_core::{Error, Result};
use scraper::Html;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::resolver::{ElementResolver, ResolvedElement};
use crate::selectors::RuleChain;

/// Supplies the current markup of the page. Consecutive calls may return
/// different documents as the page mutates.
pub trait PageSource: Send + Sync {
    fn snapshot(&self) -> Result<String>;
}

/// A page that never changes.
pub struct StaticPage {
    html: String,
}

impl StaticPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

impl PageSource for StaticPage {
    fn snapshot(&self) -> Result<String> {
        Ok(self.html.clone())
    }
}

/// A page saved to disk, re-read on every snapshot.
pub struct FilePage {
    path: PathBuf,
}

impl FilePage {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PageSource for FilePage {
    fn snapshot(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// Poll `source` until `chain` resolves or `timeout` elapses.
///
/// The first lookup happens immediately. Between lookups the task sleeps for
/// `poll_interval` (clipped to the deadline); once the deadline has passed no
/// further lookup is made and `NotFound` is returned. A snapshot that cannot
/// be read counts as a miss for that attempt.
pub async fn wait_for_element(
    source: &dyn PageSource,
    chain: &RuleChain,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<ResolvedElement> {
    let deadline = Instant::now() + timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match probe_snapshot(source, chain) {
            Ok(Some(found)) => {
                info!(chain = chain.name(), attempts, rule = %found.rule, "element appeared");
                return Ok(found);
            }
            Ok(None) => {}
            Err(e) => warn!(chain = chain.name(), attempts, "snapshot failed: {}", e),
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }

    debug!(chain = chain.name(), attempts, "wait timed out");
    Err(Error::NotFound(format!(
        "{} (after {} ms)",
        chain.name(),
        timeout.as_millis()
    )))
}

// Html is not Send, so it must not live across an await point.
fn probe_snapshot(source: &dyn PageSource, chain: &RuleChain) -> Result<Option<ResolvedElement>> {
    let markup = source.snapshot()?;
    let document = Html::parse_document(&markup);
    match ElementResolver::new(&document).capture(chain) {
        Ok(found) => Ok(Some(found)),
        Err(Error::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

//! Orchestrator: the lite-mode carry-over flow and its persisted state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use litechat_core::{config::validate_message_count, Error, LiteConfig, Result};
use litechat_dom::{wait_for_element, ChainKind, ElementResolver, PageSource, ResolvedElement};
use litechat_extract::{extract_title, MessageExtractor, SummaryComposer};
use litechat_store::{JsonFileStore, KeyValueStore, TitleVersioner};
use scraper::Html;
use tracing::{debug, info, warn};

use crate::types::*;

/// Runs the carry-over flow against a page and a persisted store.
pub struct Orchestrator {
    config: LiteConfig,
    store: Arc<dyn KeyValueStore>,
    versioner: TitleVersioner,
    extractor: MessageExtractor,
    composer: SummaryComposer,
}

impl Orchestrator {
    pub fn new(config: LiteConfig, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            versioner: TitleVersioner::new(store.clone()),
            extractor: MessageExtractor::default(),
            composer: SummaryComposer,
            config,
            store,
        }
    }

    /// Orchestrator backed by `storage.json` in the configured data directory.
    pub fn open(config: LiteConfig) -> Self {
        let store = Arc::new(JsonFileStore::new(&config.data_paths.storage_file));
        info!(
            "Orchestrator initialized: store={}",
            config.data_paths.storage_file.display()
        );
        Self::new(config, store)
    }

    pub fn versioner(&self) -> &TitleVersioner {
        &self.versioner
    }

    /// Persisted message window, or the configured default.
    ///
    /// An out-of-range or non-numeric stored value is ignored with a warning.
    pub async fn message_count(&self) -> Result<usize> {
        let stored = self.store.get(MESSAGE_COUNT_KEY).await?;
        let Some(value) = stored else {
            return Ok(self.config.message_count);
        };
        match value
            .as_u64()
            .map(|n| validate_message_count(n as usize))
        {
            Some(Ok(count)) => Ok(count),
            _ => {
                warn!("Ignoring invalid {} setting: {}", MESSAGE_COUNT_KEY, value);
                Ok(self.config.message_count)
            }
        }
    }

    pub async fn set_message_count(&self, count: usize) -> Result<usize> {
        let count = validate_message_count(count)?;
        self.store
            .set(MESSAGE_COUNT_KEY, serde_json::json!(count))
            .await?;
        info!("Message count set to {}", count);
        Ok(count)
    }

    /// Extract the recent window from `page`, issue the next versioned
    /// title and store the rendered handoff as pending.
    ///
    /// No version is issued when the page has no conversation.
    pub async fn carry(&self, page: &dyn PageSource) -> Result<Handoff> {
        let max_count = self.message_count().await?;
        let markup = page.snapshot()?;

        let (original_title, messages) = {
            let document = Html::parse_document(&markup);
            let title = extract_title(&document);
            let messages = self.extractor.extract(&document, max_count)?;
            (title, messages)
        };
        debug!(title = %original_title, messages = messages.len(), "page extracted");

        let versioned_title = self.versioner.next_version(&original_title).await?;
        let payload = self
            .composer
            .compose(&original_title, &messages, &versioned_title);

        let handoff = Handoff {
            id: uuid::Uuid::new_v4().to_string(),
            context_summary: payload.into_string(),
            versioned_title,
            original_title,
            message_count: messages.len(),
            created_at: Utc::now(),
        };
        self.store
            .set(PENDING_KEY, serde_json::to_value(&handoff)?)
            .await?;

        info!(
            "Handoff {} ready: {} messages, title {:?}",
            handoff.id, handoff.message_count, handoff.versioned_title
        );
        Ok(handoff)
    }

    /// Consume the pending handoff. A stale or unreadable one is discarded.
    pub async fn take_pending(&self) -> Result<Option<Handoff>> {
        let Some(handoff) = self.read_pending().await? else {
            return Ok(None);
        };
        self.store.remove(PENDING_KEY).await?;

        if handoff.is_stale(Utc::now()) {
            info!("Discarded stale handoff {}", handoff.id);
            return Ok(None);
        }
        Ok(Some(handoff))
    }

    /// Remove the pending handoff if it has outlived its TTL.
    /// Returns whether anything was removed.
    pub async fn prune_stale_pending(&self) -> Result<bool> {
        match self.read_pending().await? {
            Some(handoff) if handoff.is_stale(Utc::now()) => {
                self.store.remove(PENDING_KEY).await?;
                info!("Cleaned up stale handoff {}", handoff.id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Wait for the prompt input of a fresh conversation to appear.
    pub async fn wait_for_input(
        &self,
        page: &dyn PageSource,
        timeout: Option<Duration>,
    ) -> Result<ResolvedElement> {
        wait_for_element(
            page,
            &ChainKind::Input.chain(),
            timeout.unwrap_or_else(|| self.config.wait_timeout()),
            self.config.poll_interval(),
        )
        .await
    }

    /// Check which page chains resolve against the current snapshot.
    pub fn validate_selectors(&self, page: &dyn PageSource) -> Result<SelectorReport> {
        let markup = page.snapshot()?;
        let document = Html::parse_document(&markup);
        let resolver = ElementResolver::new(&document);

        let checks = ChainKind::page_chains()
            .iter()
            .map(|kind| {
                let chain = kind.chain();
                let rule = resolver.capture(&chain).ok().map(|found| found.rule);
                ChainCheck {
                    chain: kind.name().to_string(),
                    found: rule.is_some(),
                    count: resolver.resolve_all(&chain).len(),
                    rule,
                }
            })
            .collect();

        let report = SelectorReport {
            checks,
            checked_at: Utc::now(),
        };
        for c in &report.checks {
            if !c.found {
                warn!("No rule in chain {} matched", c.chain);
            }
        }
        Ok(report)
    }

    async fn read_pending(&self) -> Result<Option<Handoff>> {
        let Some(value) = self.store.get(PENDING_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_value::<Handoff>(value) {
            Ok(handoff) => Ok(Some(handoff)),
            Err(e) => {
                warn!("Dropping unreadable pending handoff: {}", e);
                self.store.remove(PENDING_KEY).await?;
                Ok(None)
            }
        }
    }
}

/// One-line, user-facing rendering of an error.
pub fn describe(err: &Error) -> String {
    match err {
        Error::EmptyConversation => "no conversation found on the page".to_string(),
        Error::NotFound(what) => format!("nothing matched: {}", what),
        other => other.to_string(),
    }
}

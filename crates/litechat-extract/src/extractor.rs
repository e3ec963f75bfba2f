//! Recent-window turn extraction and title lookup.

use litechat_core::{Error, Message, Result};
use litechat_dom::{ChainKind, ElementResolver, RoleClassifier, RuleChain};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use tracing::{debug, info};

use crate::content::ContentSanitizer;

/// Title used when the page offers none.
pub const UNTITLED_CHAT: &str = "Untitled Chat";

static TITLE_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s*\|\s*ChatGPT.*$").unwrap());

/// Current conversation title, or [`UNTITLED_CHAT`].
///
/// The document `<title>` is the last fallback; its site suffix
/// (`| ChatGPT`) is stripped.
pub fn extract_title(document: &Html) -> String {
    let element = match ElementResolver::new(document).resolve_one(&ChainKind::Title.chain()) {
        Ok(el) => el,
        Err(_) => return UNTITLED_CHAT.to_string(),
    };

    let raw: String = element.text().collect();
    let title = if element.value().name() == "title" {
        TITLE_SUFFIX_RE.replace(&raw, "").trim().to_string()
    } else {
        raw.trim().to_string()
    };

    if title.is_empty() {
        UNTITLED_CHAT.to_string()
    } else {
        title
    }
}

/// Discovers turn elements and turns them into [`Message`]s.
pub struct MessageExtractor {
    chain: RuleChain,
    classifier: RoleClassifier,
    sanitizer: ContentSanitizer,
}

impl Default for MessageExtractor {
    fn default() -> Self {
        Self::new(
            ChainKind::Messages.chain(),
            RoleClassifier::default(),
            ContentSanitizer::default(),
        )
    }
}

impl MessageExtractor {
    pub fn new(chain: RuleChain, classifier: RoleClassifier, sanitizer: ContentSanitizer) -> Self {
        Self {
            chain,
            classifier,
            sanitizer,
        }
    }

    /// Extract the last `max_count` turns, oldest first.
    ///
    /// Fails with [`Error::EmptyConversation`] when no turn element resolves.
    pub fn extract(&self, document: &Html, max_count: usize) -> Result<Vec<Message>> {
        let elements = ElementResolver::new(document).resolve_all(&self.chain);
        if elements.is_empty() {
            return Err(Error::EmptyConversation);
        }

        let start = elements.len().saturating_sub(max_count);
        let window = &elements[start..];
        debug!(
            found = elements.len(),
            kept = window.len(),
            "selected turn window"
        );

        let messages: Vec<Message> = window
            .iter()
            .enumerate()
            .map(|(index, &element)| {
                let role = self.classifier.classify(element);
                let content = self.sanitizer.extract_message_content(element);
                Message::new(role, content, index)
            })
            .collect();

        info!("Extracted {} messages", messages.len());
        Ok(messages)
    }
}

//! Lookup descriptors and the built-in fallback chains for the chat page.
//!
//! Chains are plain data, ordered from most to least reliable. Adding a
//! fallback means appending a descriptor, never a new code path.

use std::borrow::Cow;

use litechat_core::{Error, Result};
use scraper::Selector;
use serde::Serialize;

/// One way of finding an element: a CSS selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    selector: Cow<'static, str>,
}

impl Descriptor {
    pub const fn css(selector: &'static str) -> Self {
        Self {
            selector: Cow::Borrowed(selector),
        }
    }

    pub fn owned(selector: impl Into<String>) -> Self {
        Self {
            selector: Cow::Owned(selector.into()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.selector
    }

    /// Compile into a `scraper` selector. Compiled fresh on each use.
    pub fn compile(&self) -> Result<Selector> {
        Selector::parse(&self.selector).map_err(|e| Error::MalformedRule {
            rule: self.selector.to_string(),
            reason: format!("{:?}", e),
        })
    }
}

/// Ordered list of descriptors for one kind of element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleChain {
    name: Cow<'static, str>,
    descriptors: Vec<Descriptor>,
}

impl RuleChain {
    pub fn new(name: &'static str, selectors: &[&'static str]) -> Self {
        Self {
            name: Cow::Borrowed(name),
            descriptors: selectors.iter().map(|&s| Descriptor::css(s)).collect(),
        }
    }

    /// Build a chain from caller-supplied selectors.
    pub fn from_selectors<I, S>(name: impl Into<String>, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Cow::Owned(name.into()),
            descriptors: selectors.into_iter().map(Descriptor::owned).collect(),
        }
    }

    /// Append a lowest-priority fallback.
    pub fn with_fallback(mut self, descriptor: Descriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// The chains the extractor knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    /// Conversation turn containers.
    Messages,
    /// The conversation title.
    Title,
    /// The prompt input surface of a fresh conversation.
    Input,
    /// Assistant avatar images inside a turn.
    AssistantAvatar,
}

impl ChainKind {
    /// Chains checked by selector validation.
    pub fn page_chains() -> &'static [ChainKind] {
        &[Self::Messages, Self::Title, Self::Input]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Messages => "messages",
            Self::Title => "title",
            Self::Input => "input",
            Self::AssistantAvatar => "assistant-avatar",
        }
    }

    pub fn chain(&self) -> RuleChain {
        match self {
            Self::Messages => RuleChain::new(
                self.name(),
                &[
                    r#"[data-testid^="conversation-turn"]"#,
                    "article[data-scroll-anchor]",
                    ".group.w-full",
                    "article",
                    r#"div[class*="text-base"]"#,
                    "main > div > div > div",
                ],
            ),
            Self::Title => RuleChain::new(
                self.name(),
                &[
                    "h1.text-xl",
                    "h1",
                    r#"[data-testid="chat-title"]"#,
                    "header h1",
                    r#"nav button[class*="active"] span"#,
                    "title",
                ],
            ),
            Self::Input => RuleChain::new(
                self.name(),
                &[
                    "#prompt-textarea",
                    r#"textarea[id*="prompt"]"#,
                    r#"textarea[placeholder*="Message"]"#,
                    r#"textarea[data-id="root"]"#,
                    "textarea",
                    r#"[contenteditable="true"]"#,
                ],
            ),
            Self::AssistantAvatar => RuleChain::new(
                self.name(),
                &[r#"img[alt*="ChatGPT"]"#, r#"img[alt*="Assistant"]"#],
            ),
        }
    }
}

impl std::fmt::Display for ChainKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

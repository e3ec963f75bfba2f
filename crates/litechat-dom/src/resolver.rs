//! Generic fallback-chain resolution over a parsed page snapshot.

use litechat_core::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::{debug, warn};

use crate::selectors::RuleChain;

#[derive(Clone, Copy)]
enum Scope<'a> {
    Document(&'a Html),
    Element(ElementRef<'a>),
}

/// Evaluates rule chains against a document or a subtree of it.
///
/// Nothing is cached between calls: each resolution walks the chain from the
/// top against whatever tree the resolver was built on.
#[derive(Clone, Copy)]
pub struct ElementResolver<'a> {
    scope: Scope<'a>,
}

impl<'a> ElementResolver<'a> {
    /// Resolve against a whole document.
    pub fn new(document: &'a Html) -> Self {
        Self {
            scope: Scope::Document(document),
        }
    }

    /// Resolve against the descendants of one element.
    pub fn within(element: ElementRef<'a>) -> Self {
        Self {
            scope: Scope::Element(element),
        }
    }

    /// First element matched by the first descriptor that matches anything.
    pub fn resolve_one(&self, chain: &RuleChain) -> Result<ElementRef<'a>> {
        self.first_match(chain)
            .map(|(_, element)| element)
            .ok_or_else(|| Error::NotFound(chain.name().to_string()))
    }

    /// Every match of the first descriptor that yields at least one match.
    /// Matches are never merged across descriptors.
    pub fn resolve_all(&self, chain: &RuleChain) -> Vec<ElementRef<'a>> {
        for (selector, rule) in self.compiled(chain) {
            let found: Vec<ElementRef<'a>> = match self.scope {
                Scope::Document(doc) => doc.select(&selector).collect(),
                Scope::Element(el) => el.select(&selector).collect(),
            };
            if !found.is_empty() {
                debug!(chain = chain.name(), rule, count = found.len(), "resolved");
                return found;
            }
        }
        Vec::new()
    }

    /// Whether any descriptor in the chain matches.
    pub fn probe(&self, chain: &RuleChain) -> bool {
        self.first_match(chain).is_some()
    }

    /// Resolve one element and copy out the parts callers keep.
    pub fn capture(&self, chain: &RuleChain) -> Result<ResolvedElement> {
        let (rule, element) = self
            .first_match(chain)
            .ok_or_else(|| Error::NotFound(chain.name().to_string()))?;
        Ok(ResolvedElement::from_element(element, rule))
    }

    fn first_match<'c>(&self, chain: &'c RuleChain) -> Option<(&'c str, ElementRef<'a>)> {
        self.compiled(chain).into_iter().find_map(|(selector, rule)| {
            let element = match self.scope {
                Scope::Document(doc) => doc.select(&selector).next(),
                Scope::Element(el) => el.select(&selector).next(),
            };
            element.map(|e| (rule, e))
        })
    }

    /// Compile descriptors lazily, logging and skipping malformed ones.
    fn compiled<'c>(&self, chain: &'c RuleChain) -> impl Iterator<Item = (Selector, &'c str)> + 'c {
        chain.descriptors().iter().filter_map(move |d| match d.compile() {
            Ok(selector) => Some((selector, d.as_str())),
            Err(e) => {
                warn!(chain = chain.name(), "skipping rule: {}", e);
                None
            }
        })
    }
}

/// Owned copy of a resolved element, detached from the snapshot it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedElement {
    pub tag: String,
    /// Descriptor that produced the match.
    pub rule: String,
    pub text: String,
}

impl ResolvedElement {
    pub fn from_element(element: ElementRef<'_>, rule: &str) -> Self {
        Self {
            tag: element.value().name().to_string(),
            rule: rule.to_string(),
            text: element.text().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::{ChainKind, Descriptor};

    const PAGE: &str = r#"<html><body>
        <div class="b" id="first-b">b1</div>
        <div class="a" id="first-a">a1</div>
        <div class="a" id="second-a">a2</div>
        <div class="b" id="second-b">b2</div>
    </body></html>"#;

    #[test]
    fn test_resolve_one_prefers_earlier_descriptor() {
        let doc = Html::parse_document(PAGE);
        let chain = RuleChain::new("t", &[".a", ".b"]);
        let el = ElementResolver::new(&doc).resolve_one(&chain).unwrap();
        // .b appears first in the document but .a has priority
        assert_eq!(el.value().attr("id"), Some("first-a"));
    }

    #[test]
    fn test_resolve_one_falls_through_to_later_descriptor() {
        let doc = Html::parse_document(PAGE);
        let chain = RuleChain::new("t", &[".missing", ".b"]);
        let el = ElementResolver::new(&doc).resolve_one(&chain).unwrap();
        assert_eq!(el.value().attr("id"), Some("first-b"));
    }

    #[test]
    fn test_resolve_one_not_found() {
        let doc = Html::parse_document(PAGE);
        let chain = RuleChain::new("nothing", &[".x", ".y"]);
        let err = ElementResolver::new(&doc).resolve_one(&chain).unwrap_err();
        assert!(matches!(err, Error::NotFound(name) if name == "nothing"));
    }

    #[test]
    fn test_malformed_rule_is_skipped() {
        let doc = Html::parse_document(PAGE);
        let chain = RuleChain::new("t", &["div[[", ".b"]);
        let el = ElementResolver::new(&doc).resolve_one(&chain).unwrap();
        assert_eq!(el.value().attr("id"), Some("first-b"));
    }

    #[test]
    fn test_resolve_all_does_not_merge() {
        let doc = Html::parse_document(PAGE);
        let chain = RuleChain::new("t", &[".a", ".b"]);
        let all = ElementResolver::new(&doc).resolve_all(&chain);
        let ids: Vec<_> = all.iter().filter_map(|e| e.value().attr("id")).collect();
        assert_eq!(ids, vec!["first-a", "second-a"]);
    }

    #[test]
    fn test_resolve_all_empty() {
        let doc = Html::parse_document(PAGE);
        let chain = RuleChain::new("t", &[".x"]);
        assert!(ElementResolver::new(&doc).resolve_all(&chain).is_empty());
        assert!(ElementResolver::new(&doc)
            .resolve_all(&RuleChain::from_selectors("empty", Vec::<String>::new()))
            .is_empty());
    }

    #[test]
    fn test_within_scope_only_sees_descendants() {
        let doc = Html::parse_document(
            r#"<div id="outer"><img alt="ChatGPT"></div><div id="other"><p>x</p></div>"#,
        );
        let outer = ElementResolver::new(&doc)
            .resolve_one(&RuleChain::new("o", &["#outer"]))
            .unwrap();
        let other = ElementResolver::new(&doc)
            .resolve_one(&RuleChain::new("o", &["#other"]))
            .unwrap();
        let avatar = ChainKind::AssistantAvatar.chain();
        assert!(ElementResolver::within(outer).probe(&avatar));
        assert!(!ElementResolver::within(other).probe(&avatar));
    }

    #[test]
    fn test_capture_records_rule() {
        let doc = Html::parse_document(r#"<textarea id="prompt-textarea">hi</textarea>"#);
        let chain = ChainKind::Input.chain().with_fallback(Descriptor::css("body"));
        let captured = ElementResolver::new(&doc).capture(&chain).unwrap();
        assert_eq!(captured.tag, "textarea");
        assert_eq!(captured.rule, "#prompt-textarea");
        assert_eq!(captured.text, "hi");
    }
}

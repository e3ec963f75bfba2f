//! Turn author detection.
//!
//! Each heuristic inspects one signal and answers `Some(role)` when that
//! signal is decisive, `None` when it says nothing. The first decisive
//! heuristic wins; if none is, the turn is attributed to the assistant.

use litechat_core::Role;
use scraper::ElementRef;

use crate::resolver::ElementResolver;
use crate::selectors::{ChainKind, RuleChain};

/// A single tri-state role signal.
pub type Heuristic = fn(ElementRef<'_>) -> Option<Role>;

const ROLE_ATTR: &str = "data-message-author-role";

/// Ordered heuristic chain deciding the author of a turn element.
pub struct RoleClassifier {
    heuristics: Vec<(&'static str, Heuristic)>,
}

impl Default for RoleClassifier {
    fn default() -> Self {
        Self::new(vec![
            ("role-attribute", role_attribute as Heuristic),
            ("nested-role-attribute", nested_role_attribute as Heuristic),
            ("test-id", test_id as Heuristic),
            ("class-name", class_name as Heuristic),
            ("assistant-avatar", assistant_avatar as Heuristic),
        ])
    }
}

impl RoleClassifier {
    pub fn new(heuristics: Vec<(&'static str, Heuristic)>) -> Self {
        Self { heuristics }
    }

    /// Classify a turn element. Falls back to [`Role::Assistant`].
    pub fn classify(&self, element: ElementRef<'_>) -> Role {
        self.heuristics
            .iter()
            .find_map(|(name, heuristic)| {
                heuristic(element).map(|role| {
                    tracing::trace!(heuristic = name, %role, "role decided");
                    role
                })
            })
            .unwrap_or(Role::Assistant)
    }
}

fn role_from_attr(value: &str) -> Role {
    if value == "user" {
        Role::User
    } else {
        Role::Assistant
    }
}

/// Non-empty attribute value; an empty attribute says nothing.
fn non_empty_attr<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name).filter(|v| !v.trim().is_empty())
}

/// Explicit author attribute on the turn itself.
pub fn role_attribute(element: ElementRef<'_>) -> Option<Role> {
    non_empty_attr(&element, ROLE_ATTR).map(role_from_attr)
}

/// Author attribute on the first descendant that carries one.
pub fn nested_role_attribute(element: ElementRef<'_>) -> Option<Role> {
    let chain = RuleChain::new("nested-role", &["[data-message-author-role]"]);
    ElementResolver::within(element)
        .resolve_one(&chain)
        .ok()
        .and_then(|inner| non_empty_attr(&inner, ROLE_ATTR))
        .map(role_from_attr)
}

/// Test identifiers mentioning "user" mark user turns; any other id says assistant.
pub fn test_id(element: ElementRef<'_>) -> Option<Role> {
    non_empty_attr(&element, "data-testid").map(|id| {
        if id.contains("user") {
            Role::User
        } else {
            Role::Assistant
        }
    })
}

pub fn class_name(element: ElementRef<'_>) -> Option<Role> {
    let class = element.value().attr("class")?;
    if class.contains("user") {
        Some(Role::User)
    } else if class.contains("assistant") {
        Some(Role::Assistant)
    } else {
        None
    }
}

pub fn assistant_avatar(element: ElementRef<'_>) -> Option<Role> {
    ElementResolver::within(element)
        .probe(&ChainKind::AssistantAvatar.chain())
        .then_some(Role::Assistant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn classify(html: &str) -> Role {
        let doc = Html::parse_document(html);
        let sel = Selector::parse("#turn").unwrap();
        let el = doc.select(&sel).next().unwrap();
        RoleClassifier::default().classify(el)
    }

    #[test]
    fn test_role_attribute() {
        assert_eq!(
            classify(r#"<div id="turn" data-message-author-role="user">hi</div>"#),
            Role::User
        );
        assert_eq!(
            classify(r#"<div id="turn" data-message-author-role="assistant" class="user">hi</div>"#),
            Role::Assistant
        );
    }

    #[test]
    fn test_nested_role_beats_test_id() {
        let html = r#"<article id="turn" data-testid="conversation-turn-3">
            <div data-message-author-role="user">question</div></article>"#;
        assert_eq!(classify(html), Role::User);
    }

    #[test]
    fn test_test_id() {
        assert_eq!(
            classify(r#"<div id="turn" data-testid="user-message">hi</div>"#),
            Role::User
        );
        assert_eq!(
            classify(r#"<div id="turn" data-testid="conversation-turn-2" class="user">hi</div>"#),
            Role::Assistant
        );
    }

    #[test]
    fn test_empty_attributes_are_not_decisive() {
        let html = r#"<div id="turn" data-message-author-role="" class="user-bubble">hi</div>"#;
        let doc = Html::parse_document(html);
        let el = doc.select(&Selector::parse("#turn").unwrap()).next().unwrap();
        assert_eq!(role_attribute(el), None);
        assert_eq!(classify(html), Role::User);

        let html = r#"<div id="turn" data-testid="" class="user-bubble">hi</div>"#;
        let doc = Html::parse_document(html);
        let el = doc.select(&Selector::parse("#turn").unwrap()).next().unwrap();
        assert_eq!(test_id(el), None);
        assert_eq!(classify(html), Role::User);
    }

    #[test]
    fn test_class_name() {
        assert_eq!(classify(r#"<div id="turn" class="msg user-bubble">hi</div>"#), Role::User);
        assert_eq!(
            classify(r#"<div id="turn" class="msg assistant-bubble">hi</div>"#),
            Role::Assistant
        );
    }

    #[test]
    fn test_avatar_marks_assistant() {
        let classifier = RoleClassifier::new(vec![("avatar", assistant_avatar as Heuristic)]);
        let doc = Html::parse_document(r#"<div id="turn"><img alt="ChatGPT logo">hi</div>"#);
        let el = doc.select(&Selector::parse("#turn").unwrap()).next().unwrap();
        assert_eq!(assistant_avatar(el), Some(Role::Assistant));
        assert_eq!(classifier.classify(el), Role::Assistant);
    }

    #[test]
    fn test_defaults_to_assistant_when_all_unknown() {
        let doc = Html::parse_document(r#"<div id="turn" class="bubble"><p>hello</p></div>"#);
        let el = doc.select(&Selector::parse("#turn").unwrap()).next().unwrap();
        for (_, h) in &RoleClassifier::default().heuristics {
            assert_eq!(h(el), None);
        }
        assert_eq!(RoleClassifier::default().classify(el), Role::Assistant);
    }

    #[test]
    fn test_first_decisive_heuristic_wins() {
        fn unknown(_: ElementRef<'_>) -> Option<Role> {
            None
        }
        fn user(_: ElementRef<'_>) -> Option<Role> {
            Some(Role::User)
        }
        fn assistant(_: ElementRef<'_>) -> Option<Role> {
            Some(Role::Assistant)
        }
        let classifier = RoleClassifier::new(vec![
            ("unknown", unknown as Heuristic),
            ("user", user as Heuristic),
            ("assistant", assistant as Heuristic),
        ]);
        let doc = Html::parse_document(r#"<div id="turn"></div>"#);
        let el = doc.select(&Selector::parse("#turn").unwrap()).next().unwrap();
        assert_eq!(classifier.classify(el), Role::User);
    }
}

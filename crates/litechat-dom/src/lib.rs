//! Page access for LiteChat: fallback-chain element resolution over HTML
//! snapshots, turn role heuristics, and bounded waits for late elements.
//!
//! The chat page is not under our control and its markup shifts between
//! releases, so every lookup goes through an ordered [`RuleChain`] instead
//! of a single selector.

pub mod page;
pub mod resolver;
pub mod role;
pub mod selectors;

pub use page::{wait_for_element, FilePage, PageSource, StaticPage};
pub use resolver::{ElementResolver, ResolvedElement};
pub use role::RoleClassifier;
pub use selectors::{ChainKind, Descriptor, RuleChain};

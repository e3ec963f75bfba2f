//! Conversation extraction and context summary rendering.
//!
//! Pulls the recent window of turns off a page snapshot, flattens each turn
//! to text while keeping code blocks intact, and renders the carry-over
//! payload for a fresh conversation.

pub mod content;
pub mod extractor;
pub mod summary;

pub use content::{CodeSegment, ContentSanitizer, SanitizedContent};
pub use extractor::{extract_title, MessageExtractor, UNTITLED_CHAT};
pub use summary::{ContextPayload, SummaryComposer, SummarySignals};

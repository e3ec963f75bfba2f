//! Context summary: heuristic signals plus the carry-over template.
//!
//! Topics, concepts and open questions are cheap regex heuristics. An empty
//! signal list renders as a fallback phrase; nothing here can fail.

use litechat_core::Message;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

const MAX_TOPICS: usize = 3;
const TOPICS_PER_MESSAGE: usize = 3;
const MAX_CONCEPTS: usize = 3;
const MAX_QUESTIONS: usize = 2;
/// Only the most recent user turns are scanned for open questions.
const QUESTION_WINDOW: usize = 2;

static TOPIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").unwrap());
static QUESTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]*\?").unwrap());

/// Concept label → detector, in reporting order.
static CONCEPT_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("code examples", Regex::new(r"```").unwrap()),
        (
            "programming",
            Regex::new(r"\b(?:function|class|import|const|let|var|def|public|private)\b").unwrap(),
        ),
        (
            "technical concepts",
            Regex::new(r"(?i)[∑∫∂√±×÷]|\b(?:algorithm|equation|formula)\b").unwrap(),
        ),
        (
            "data analysis",
            Regex::new(r"(?i)\b(?:data|analysis|visualization|chart|graph|statistics)\b").unwrap(),
        ),
    ]
});

/// Best-effort signals derived from a message window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummarySignals {
    pub topics: Vec<String>,
    pub concepts: Vec<String>,
    pub open_questions: Vec<String>,
}

impl SummarySignals {
    pub fn from_messages(messages: &[Message]) -> Self {
        Self {
            topics: extract_topics(messages),
            concepts: extract_concepts(messages),
            open_questions: extract_open_questions(messages),
        }
    }
}

/// Capitalized phrases from user turns, first seen first.
pub fn extract_topics(messages: &[Message]) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    for msg in messages.iter().filter(|m| m.is_user()) {
        for m in TOPIC_RE.find_iter(&msg.content).take(TOPICS_PER_MESSAGE) {
            if !topics.iter().any(|t| t == m.as_str()) {
                topics.push(m.as_str().to_string());
            }
        }
    }
    topics.truncate(MAX_TOPICS);
    topics
}

/// Concept labels present anywhere in the window, first detected first.
pub fn extract_concepts(messages: &[Message]) -> Vec<String> {
    let mut concepts: Vec<String> = Vec::new();
    for msg in messages {
        for (label, re) in CONCEPT_PATTERNS.iter() {
            if re.is_match(&msg.content) && !concepts.iter().any(|c| c == label) {
                concepts.push(label.to_string());
            }
        }
    }
    concepts.truncate(MAX_CONCEPTS);
    concepts
}

/// Question sentences from the last two user turns.
pub fn extract_open_questions(messages: &[Message]) -> Vec<String> {
    let user: Vec<&Message> = messages.iter().filter(|m| m.is_user()).collect();
    let recent = &user[user.len().saturating_sub(QUESTION_WINDOW)..];

    recent
        .iter()
        .flat_map(|msg| QUESTION_RE.find_iter(&msg.content))
        .map(|m| m.as_str().trim())
        .filter(|q| {
            let len = q.chars().count();
            len > 10 && len < 150
        })
        .take(MAX_QUESTIONS)
        .map(str::to_string)
        .collect()
}

/// Message history as "User:" / "Assistant:" blocks separated by rules.
pub fn format_messages(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|msg| format!("{}\n{}", msg.role.label(), msg.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Final rendered carry-over text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContextPayload(String);

impl ContextPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for ContextPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders the carry-over payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryComposer;

impl SummaryComposer {
    pub fn compose(
        &self,
        original_title: &str,
        messages: &[Message],
        versioned_title: &str,
    ) -> ContextPayload {
        let signals = SummarySignals::from_messages(messages);
        self.render(original_title, &signals, messages, versioned_title)
    }

    pub fn render(
        &self,
        original_title: &str,
        signals: &SummarySignals,
        messages: &[Message],
        versioned_title: &str,
    ) -> ContextPayload {
        let topics = or_fallback(&signals.topics, ", ", "Continuing discussion");
        let concepts = or_fallback(&signals.concepts, ", ", "Various topics");
        let questions = or_fallback(&signals.open_questions, "; ", "To be determined");

        ContextPayload(format!(
            "I'm continuing our previous conversation. Here's the checkpoint:\n\
             \n\
             Source: {original_title}\n\
             \n\
             Summary:\n\
             • Main topic: {topics}\n\
             • Concepts covered: {concepts}\n\
             • Open questions / next steps: {questions}\n\
             \n\
             Recent conversation history:\n\
             {history}\n\
             \n\
             Please continue from where we left off. Also, please set this chat's title to: \"{versioned_title}\"",
            history = format_messages(messages),
        ))
    }
}

fn or_fallback(items: &[String], separator: &str, fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(separator)
    }
}

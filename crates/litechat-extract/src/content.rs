//! Turn content sanitization.
//!
//! A turn element is flattened to text with UI decoration skipped. Each
//! `<pre>` region is lifted out as a [`CodeSegment`] and a positional marker
//! is left in its place; once the prose is flattened and trimmed, the markers
//! are swapped for fenced blocks. The page tree is only ever read.

use litechat_dom::Descriptor;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use scraper::{ElementRef, Selector};
use serde::Serialize;
use tracing::warn;

/// Non-content elements dropped before flattening.
pub const DECORATION_RULES: &[&str] = &[
    "button",
    r#"[role="button"]"#,
    ".avatar",
    r#"img[alt*="avatar"]"#,
    r#"img[alt*="ChatGPT"]"#,
    r#"img[alt*="User"]"#,
    r#"[class*="copy-button"]"#,
    r#"[class*="edit-button"]"#,
    "svg",
];

static LANGUAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"language-(\w+)").unwrap());
static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("\u{E000}CODE_BLOCK_(\\d+)\u{E000}").unwrap());
static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static CODE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("code").unwrap());

/// A code region lifted out of a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeSegment {
    /// Empty when the markup carries no `language-*` class.
    pub language: String,
    pub code: String,
}

impl CodeSegment {
    pub fn fenced(&self) -> String {
        format!("```{}\n{}\n```", self.language, self.code)
    }
}

/// Flattened turn text plus the code segments found in it, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SanitizedContent {
    pub text: String,
    pub segments: Vec<CodeSegment>,
}

fn marker(index: usize) -> String {
    format!("\u{E000}CODE_BLOCK_{}\u{E000}", index)
}

/// Flattens turn elements into clean text.
pub struct ContentSanitizer {
    decoration: Vec<Selector>,
}

impl Default for ContentSanitizer {
    fn default() -> Self {
        Self::new(DECORATION_RULES.iter().map(|&rule| Descriptor::css(rule)))
    }
}

impl ContentSanitizer {
    /// Build from decoration descriptors. Malformed ones are logged and dropped.
    pub fn new(rules: impl IntoIterator<Item = Descriptor>) -> Self {
        let decoration = rules
            .into_iter()
            .filter_map(|d| match d.compile() {
                Ok(selector) => Some(selector),
                Err(e) => {
                    warn!("ignoring decoration rule: {}", e);
                    None
                }
            })
            .collect();
        Self { decoration }
    }

    /// Flatten a turn into text with fenced code blocks in place.
    pub fn extract_message_content(&self, element: ElementRef<'_>) -> String {
        self.sanitize(element).text
    }

    pub fn sanitize(&self, element: ElementRef<'_>) -> SanitizedContent {
        let mut flat = Flattener {
            sanitizer: self,
            text: String::new(),
            segments: Vec::new(),
        };
        flat.walk(element);

        let Flattener { text, segments, .. } = flat;
        let text = MARKER_RE.replace_all(text.trim(), |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| segments.get(i))
                .map(|seg| format!("\n{}\n", seg.fenced()))
                .unwrap_or_default()
        });
        let text = BLANK_RUN_RE.replace_all(&text, "\n\n").into_owned();

        SanitizedContent { text, segments }
    }

    fn is_decoration(&self, element: &ElementRef<'_>) -> bool {
        self.decoration.iter().any(|s| s.matches(element))
    }
}

struct Flattener<'s> {
    sanitizer: &'s ContentSanitizer,
    text: String,
    segments: Vec<CodeSegment>,
}

impl Flattener<'_> {
    /// Descendants only; the turn element itself is never treated as decoration.
    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            if let Some(el) = ElementRef::wrap(child) {
                if self.sanitizer.is_decoration(&el) {
                    continue;
                }
                if el.value().name() == "pre" {
                    let segment = self.code_segment(el);
                    self.text.push_str(&marker(self.segments.len()));
                    self.segments.push(segment);
                    continue;
                }
                self.walk(el);
            } else if let Some(text) = child.value().as_text() {
                self.text.push_str(text);
            }
        }
    }

    fn code_segment(&self, pre: ElementRef<'_>) -> CodeSegment {
        let code = pre.select(&CODE_SELECTOR).next();
        let language = code
            .into_iter()
            .chain(std::iter::once(pre))
            .find_map(language_of)
            .unwrap_or_default();
        let mut body = String::new();
        self.plain_text(code.unwrap_or(pre), &mut body);
        CodeSegment {
            language,
            code: body,
        }
    }

    fn plain_text(&self, element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            if let Some(el) = ElementRef::wrap(child) {
                if !self.sanitizer.is_decoration(&el) {
                    self.plain_text(el, out);
                }
            } else if let Some(text) = child.value().as_text() {
                out.push_str(text);
            }
        }
    }
}

fn language_of(element: ElementRef<'_>) -> Option<String> {
    let class = element.value().attr("class")?;
    LANGUAGE_RE.captures(class).map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn sanitize(html: &str) -> SanitizedContent {
        let doc = Html::parse_document(html);
        let sel = Selector::parse("#turn").unwrap();
        let el = doc.select(&sel).next().unwrap();
        ContentSanitizer::default().sanitize(el)
    }

    #[test]
    fn test_code_block_round_trip() {
        let out = sanitize(
            r#"<div id="turn"><p>Try this:</p><pre><code class="language-python">print(1)</code></pre><p>Then run it.</p></div>"#,
        );
        assert!(out.text.contains("```python\nprint(1)\n```"));
        assert_eq!(out.text.matches("```").count(), 2);
        assert!(out.text.starts_with("Try this:"));
        assert!(out.text.ends_with("Then run it."));
        assert!(!out.text.contains("CODE_BLOCK"));
        assert_eq!(
            out.segments,
            vec![CodeSegment {
                language: "python".into(),
                code: "print(1)".into()
            }]
        );
    }

    #[test]
    fn test_decoration_removed() {
        let out = sanitize(
            r#"<div id="turn"><img class="avatar" alt="User avatar"><button>Copy</button><span role="button">Edit</span><svg><text>icon</text></svg><p>Real text</p></div>"#,
        );
        assert_eq!(out.text, "Real text");
    }

    #[test]
    fn test_copy_button_inside_code_header_skipped() {
        let out = sanitize(
            r#"<div id="turn"><pre><div class="header"><button class="copy-button">Copy code</button></div><code class="hljs language-rust">fn main() {}</code></pre></div>"#,
        );
        assert_eq!(out.segments.len(), 1);
        assert_eq!(out.segments[0].language, "rust");
        assert_eq!(out.segments[0].code, "fn main() {}");
        assert!(!out.text.contains("Copy code"));
    }

    #[test]
    fn test_missing_language_gives_empty_tag() {
        let out = sanitize(r#"<div id="turn"><pre>ls -la</pre></div>"#);
        assert!(out.text.contains("```\nls -la\n```"));
        assert_eq!(out.segments[0].language, "");
    }

    #[test]
    fn test_language_from_pre_class() {
        let out = sanitize(r#"<div id="turn"><pre class="language-bash"><code>echo hi</code></pre></div>"#);
        assert_eq!(out.segments[0].language, "bash");
    }

    #[test]
    fn test_segments_keep_document_order() {
        let out = sanitize(
            r#"<div id="turn">A<pre><code class="language-js">one()</code></pre>B<pre><code class="language-go">two()</code></pre>C</div>"#,
        );
        let langs: Vec<_> = out.segments.iter().map(|s| s.language.as_str()).collect();
        assert_eq!(langs, vec!["js", "go"]);
        let first = out.text.find("one()").unwrap();
        let second = out.text.find("two()").unwrap();
        assert!(first < second);
        assert!(out.text.find('B').unwrap() > first && out.text.find('B').unwrap() < second);
    }

    #[test]
    fn test_empty_turn_gives_empty_content() {
        let out = sanitize(r#"<div id="turn"><button>Regenerate</button><img alt="ChatGPT"></div>"#);
        assert_eq!(out.text, "");
        assert!(out.segments.is_empty());
    }

    #[test]
    fn test_blank_runs_collapse() {
        let out = sanitize("<div id=\"turn\"><p>one</p>\n\n\n\n<p>two</p></div>");
        assert_eq!(out.text, "one\n\ntwo");
    }
}

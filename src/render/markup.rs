// FormRelay - Line-level markup classification
//
// Additive only: each paragraph line keeps its original text, and the kind and
// spans are hints for richer display. Nothing here can drop input.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("heading regex"));
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-*•]\s+(.*)$").expect("bullet regex"));
static NUMBERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)[.)]\s+(.*)$").expect("numbered regex"));
static STRONG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("strong regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineKind {
    Text,
    Heading { level: u8 },
    Bullet,
    Numbered { number: u32 },
    /// Blank line, kept as an explicit break.
    Break,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub strong: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub kind: LineKind,
    /// The source line, verbatim.
    pub text: String,
    /// Display content after the marker, split into plain and strong runs.
    pub spans: Vec<Span>,
}

pub fn classify_line(raw: &str) -> Line {
    let trimmed = raw.trim();

    let (kind, content) = if trimmed.is_empty() {
        (LineKind::Break, "")
    } else if let Some(caps) = HEADING_RE.captures(trimmed) {
        let level = caps.get(1).map_or(1, |m| m.as_str().len()) as u8;
        (LineKind::Heading { level }, caps.get(2).map_or("", |m| m.as_str()))
    } else if let Some(caps) = NUMBERED_RE.captures(trimmed) {
        match caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) {
            Some(number) => (
                LineKind::Numbered { number },
                caps.get(2).map_or("", |m| m.as_str()),
            ),
            None => (LineKind::Text, trimmed),
        }
    } else if let Some(caps) = BULLET_RE.captures(trimmed) {
        (LineKind::Bullet, caps.get(1).map_or("", |m| m.as_str()))
    } else {
        (LineKind::Text, trimmed)
    };

    Line {
        kind,
        text: raw.to_string(),
        spans: split_strong(content),
    }
}

/// Split `**bold**` runs out of a line. Unbalanced markers stay literal.
pub fn split_strong(content: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in STRONG_RE.captures_iter(content) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Span {
                text: content[last..whole.start()].to_string(),
                strong: false,
            });
        }
        spans.push(Span {
            text: inner.as_str().to_string(),
            strong: true,
        });
        last = whole.end();
    }

    if last < content.len() {
        spans.push(Span {
            text: content[last..].to_string(),
            strong: false,
        });
    }
    spans
}

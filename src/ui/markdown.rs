//! Minimal markdown emphasis for agent replies.
//!
//! Only `**bold**` and `*italic*` are recognized. Unbalanced markers are
//! left in the text as typed.

use owo_colors::OwoColorize;

/// A run of reply text with its emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Plain(String),
    Bold(String),
    Italic(String),
}

/// Splits text into emphasis spans.
pub fn parse(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while let Some(start) = rest.find('*') {
        let (marker, close) = if rest[start..].starts_with("**") {
            ("**", rest[start + 2..].find("**").map(|i| start + 2 + i))
        } else {
            ("*", rest[start + 1..].find('*').map(|i| start + 1 + i))
        };

        match close {
            Some(end) if end > start + marker.len() => {
                plain.push_str(&rest[..start]);
                if !plain.is_empty() {
                    spans.push(Span::Plain(std::mem::take(&mut plain)));
                }
                let inner = rest[start + marker.len()..end].to_string();
                spans.push(if marker == "**" {
                    Span::Bold(inner)
                } else {
                    Span::Italic(inner)
                });
                rest = &rest[end + marker.len()..];
            }
            _ => {
                plain.push_str(&rest[..start + marker.len()]);
                rest = &rest[start + marker.len()..];
            }
        }
    }
    plain.push_str(rest);
    if !plain.is_empty() {
        spans.push(Span::Plain(plain));
    }
    spans
}

/// Renders emphasis with ANSI styles, or strips the markers when `colored`
/// is false.
pub fn render(text: &str, colored: bool) -> String {
    parse(text)
        .into_iter()
        .map(|span| match span {
            Span::Plain(s) => s,
            Span::Bold(s) if colored => s.bold().to_string(),
            Span::Italic(s) if colored => s.italic().to_string(),
            Span::Bold(s) | Span::Italic(s) => s,
        })
        .collect()
}

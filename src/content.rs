//! Math-delimiter content parser.
//!
//! Question and answer content mixes plain text with embedded LaTeX bounded by
//! several historical delimiter conventions: `¡...¡` / `¡¡...¡¡` (and the even
//! older `¡...!` / `¡¡...!!`), `$...$` / `$$...$$`, and `\(...\)` / `\[...\]`.
//! Everything is rewritten to the dollar convention first, then split into an
//! ordered sequence of typed segments ready for a typesetting frontend.
//!
//! Malformed input never fails: an unmatched delimiter is passed through as
//! literal text.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Text,
    Math,
}

/// One run of content, in original left-to-right order. `display` is only
/// meaningful for math segments: `true` renders on its own line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub content: String,
    pub display: bool,
}

impl Segment {
    fn text(content: &str) -> Self {
        Segment {
            kind: SegmentKind::Text,
            content: content.to_owned(),
            display: false,
        }
    }

    fn math(content: &str, display: bool) -> Self {
        Segment {
            kind: SegmentKind::Math,
            content: content.to_owned(),
            display,
        }
    }
}

lazy_static! {
    // Longest/most specific patterns first, so a double marker is never
    // consumed as two single ones.
    static ref BANG_BLOCK: Regex = Regex::new(r"¡¡([\s\S]*?)¡¡").unwrap();
    static ref BANG_BLOCK_LEGACY: Regex = Regex::new(r"¡¡([\s\S]*?)!!").unwrap();
    static ref BANG_INLINE: Regex = Regex::new(r"¡([\s\S]*?)¡").unwrap();
    static ref BANG_INLINE_LEGACY: Regex = Regex::new(r"¡([\s\S]*?)!").unwrap();
    static ref BRACKET_BLOCK: Regex = Regex::new(r"\\\[([\s\S]*?)\\\]").unwrap();
    static ref PAREN_INLINE: Regex = Regex::new(r"\\\(([\s\S]*?)\\\)").unwrap();
    // Canonical markers. Block is tried before inline at each position.
    static ref MARKER: Regex = Regex::new(r"\$\$([^$]*)\$\$|\$([^$]*)\$").unwrap();
}

/// Rewrite every recognized legacy delimiter pair into the canonical dollar
/// convention: `$...$` inline, `$$...$$` block.
pub fn normalize_delimiters(content: &str) -> String {
    let content = BANG_BLOCK.replace_all(content, "$$$$${1}$$$$");
    let content = BANG_BLOCK_LEGACY.replace_all(&content, "$$$$${1}$$$$");
    let content = BANG_INLINE.replace_all(&content, "$$${1}$$");
    let content = BANG_INLINE_LEGACY.replace_all(&content, "$$${1}$$");
    let content = BRACKET_BLOCK.replace_all(&content, "$$$$${1}$$$$");
    PAREN_INLINE.replace_all(&content, "$$${1}$$").into_owned()
}

/// Split a content string into text and math segments.
///
/// Empty segments are dropped; text segments keep their original whitespace
/// (newlines are significant downstream). Never errors: worst case the whole
/// input comes back as a single text segment.
pub fn parse_content(content: &str) -> Vec<Segment> {
    let normalized = normalize_delimiters(content);
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in MARKER.captures_iter(&normalized) {
        let m = caps.get(0).unwrap();
        if m.start() > last {
            push_text(&mut segments, &normalized[last..m.start()]);
        }
        let (body, display) = match caps.get(1) {
            Some(block) => (block.as_str(), true),
            None => (caps.get(2).unwrap().as_str(), false),
        };
        let body = body.trim();
        if !body.is_empty() {
            segments.push(Segment::math(body, display));
        }
        last = m.end();
    }
    if last < normalized.len() {
        push_text(&mut segments, &normalized[last..]);
    }
    segments
}

fn push_text(segments: &mut Vec<Segment>, raw: &str) {
    if !raw.is_empty() {
        segments.push(Segment::text(raw));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through_unchanged() {
        let input = "El área de un círculo\ndepende de su radio";
        let segments = parse_content(input);
        assert_eq!(segments, vec![Segment::text(input)]);
    }

    #[test]
    fn single_marker_is_inline_math() {
        let segments = parse_content("¡x^2¡");
        assert_eq!(segments, vec![Segment::math("x^2", false)]);
    }

    #[test]
    fn double_marker_is_block_math() {
        let segments = parse_content("¡¡x^2¡¡");
        assert_eq!(segments, vec![Segment::math("x^2", true)]);
    }

    #[test]
    fn mixed_content_keeps_order_and_whitespace() {
        let segments = parse_content("a ¡b¡ c");
        assert_eq!(
            segments,
            vec![
                Segment::text("a "),
                Segment::math("b", false),
                Segment::text(" c"),
            ]
        );
    }

    #[test]
    fn legacy_bang_close_is_recognized() {
        let segments = parse_content("resuelve ¡2x + 1 = 5!");
        assert_eq!(
            segments,
            vec![
                Segment::text("resuelve "),
                Segment::math("2x + 1 = 5", false),
            ]
        );
    }

    #[test]
    fn latex_escapes_are_normalized() {
        let segments = parse_content(r"\(a+b\) y luego \[c^2\]");
        assert_eq!(
            segments,
            vec![
                Segment::math("a+b", false),
                Segment::text(" y luego "),
                Segment::math("c^2", true),
            ]
        );
    }

    #[test]
    fn dollar_convention_is_already_canonical() {
        let segments = parse_content("suma $1+1$ y $$2+2$$");
        assert_eq!(
            segments,
            vec![
                Segment::text("suma "),
                Segment::math("1+1", false),
                Segment::text(" y "),
                Segment::math("2+2", true),
            ]
        );
    }

    #[test]
    fn unmatched_delimiter_degrades_to_text() {
        let segments = parse_content("precio: $25 pesos");
        assert_eq!(segments, vec![Segment::text("precio: $25 pesos")]);
    }

    #[test]
    fn math_body_is_trimmed() {
        let segments = parse_content("¡  x + y  ¡");
        assert_eq!(segments, vec![Segment::math("x + y", false)]);
    }

    #[test]
    fn empty_math_segments_are_dropped() {
        assert_eq!(parse_content("¡¡"), Vec::<Segment>::new());
        assert_eq!(parse_content("a¡¡b"), vec![Segment::text("a"), Segment::text("b")]);
    }
}

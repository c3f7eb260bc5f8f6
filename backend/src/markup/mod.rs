//! Markup-to-plain-text converters for the dialects found in SWORD
//! modules: OSIS, ThML, GBF and TEI.
//!
//! All four converters share a single-pass, tag-tolerant scanner. Tags
//! the converter does not recognize are void (the tag is dropped, its
//! content kept), a `<` that does not open a well-formed tag is literal
//! text, and inter-word spacing survives tag removal byte for byte, so
//! input with no markup round-trips unchanged.

pub mod gbf;
pub mod osis;
pub mod tei;
pub mod thml;

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{ConversionResult, SourceType};

pub use gbf::GbfConverter;
pub use osis::OsisConverter;
pub use tei::TeiConverter;
pub use thml::ThmlConverter;

/// Converts one dialect of verse markup to plain text plus the
/// annotations embedded in it. Implementations are pure functions.
pub trait MarkupConverter {
    fn convert(&self, raw: &str) -> ConversionResult;
}

/// Picks the converter matching a module's declared source type.
/// `Plain` gets the OSIS converter, which passes markup-free text
/// through untouched.
pub fn converter_for(source_type: SourceType) -> Box<dyn MarkupConverter + Send + Sync> {
    match source_type {
        SourceType::Osis | SourceType::Plain => Box::new(OsisConverter::default()),
        SourceType::Thml => Box::new(ThmlConverter::default()),
        SourceType::Gbf => Box::new(GbfConverter::default()),
        SourceType::Tei => Box::new(TeiConverter::default()),
    }
}

lazy_static! {
    static ref ATTR_RE: Regex =
        Regex::new(r#"([A-Za-z][\w:.-]*)\s*=\s*"([^"]*)""#).expect("attr regex");
}

/// A scanned tag: the text between `<` and `>`, unparsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tag<'a> {
    raw: &'a str,
}

impl<'a> Tag<'a> {
    pub(crate) fn raw(&self) -> &'a str {
        self.raw
    }

    pub(crate) fn is_closing(&self) -> bool {
        self.raw.starts_with('/')
    }

    pub(crate) fn is_self_closing(&self) -> bool {
        self.raw.trim_end().ends_with('/')
    }

    /// Tag name with case preserved (GBF distinguishes `<WH…>` from
    /// `<Wh>` by case).
    pub(crate) fn name(&self) -> &'a str {
        let body = self.raw.strip_prefix('/').unwrap_or(self.raw);
        let end = body
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .unwrap_or(body.len());
        &body[..end]
    }

    pub(crate) fn attr(&self, name: &str) -> Option<&'a str> {
        for caps in ATTR_RE.captures_iter(self.raw) {
            let key = caps.get(1)?.as_str();
            if key.eq_ignore_ascii_case(name) {
                return Some(caps.get(2).map(|m| m.as_str()).unwrap_or(""));
            }
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Text(&'a str),
    Tag(Tag<'a>),
}

fn looks_like_tag(inner: &str) -> bool {
    if inner.contains('<') {
        return false;
    }
    let body = inner.strip_prefix('/').unwrap_or(inner);
    matches!(
        body.chars().next(),
        Some(c) if c.is_ascii_alphabetic() || c == '!' || c == '?'
    )
}

/// Splits input into literal text runs and tags. Never fails: anything
/// that does not scan as a tag stays literal text.
pub(crate) fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut pos = 0;
    let mut text_start = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'<' {
            let close = bytes[pos + 1..].iter().position(|&b| b == b'>');
            if let Some(rel) = close {
                let end = pos + 1 + rel;
                let inner = &input[pos + 1..end];
                if looks_like_tag(inner) {
                    if text_start < pos {
                        tokens.push(Token::Text(&input[text_start..pos]));
                    }
                    tokens.push(Token::Tag(Tag { raw: inner }));
                    pos = end + 1;
                    text_start = pos;
                    continue;
                }
            }
        }
        pos += 1;
    }

    if text_start < bytes.len() {
        tokens.push(Token::Text(&input[text_start..]));
    }

    tokens
}

/// Entity decoding happens once, after tag removal.
pub(crate) fn decode_entities(text: String) -> String {
    if text.contains('&') {
        html_escape::decode_html_entities(&text).into_owned()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> String {
        tokenize(input)
            .into_iter()
            .filter_map(|t| match t {
                Token::Text(s) => Some(s),
                Token::Tag(_) => None,
            })
            .collect()
    }

    #[test]
    fn plain_text_is_one_token() {
        let tokens = tokenize("In the beginning");
        assert_eq!(tokens, vec![Token::Text("In the beginning")]);
    }

    #[test]
    fn tags_are_split_out() {
        let tokens = tokenize("a<w>b</w>c");
        assert_eq!(tokens.len(), 5);
        assert_eq!(texts("a<w>b</w>c"), "abc");
    }

    #[test]
    fn stray_angle_brackets_stay_literal() {
        assert_eq!(texts("1 < 2 and 3 > 2"), "1 < 2 and 3 > 2");
        assert_eq!(texts("unclosed <w lemma="), "unclosed <w lemma=");
        assert_eq!(texts("<1notatag>"), "<1notatag>");
    }

    #[test]
    fn spacing_around_tags_is_preserved() {
        assert_eq!(texts("one <x/> two"), "one  two");
        assert_eq!(texts("one<x/>two"), "onetwo");
    }

    #[test]
    fn tag_accessors() {
        let tokens = tokenize(r#"<w lemma="strong:H0430" morph="x"/>"#);
        let Token::Tag(tag) = tokens[0] else { panic!() };
        assert_eq!(tag.name(), "w");
        assert!(tag.is_self_closing());
        assert!(!tag.is_closing());
        assert_eq!(tag.attr("lemma"), Some("strong:H0430"));
        assert_eq!(tag.attr("morph"), Some("x"));
        assert_eq!(tag.attr("missing"), None);

        let tokens = tokenize("</note>");
        let Token::Tag(tag) = tokens[0] else { panic!() };
        assert!(tag.is_closing());
        assert_eq!(tag.name(), "note");
    }

    #[test]
    fn combining_marks_survive() {
        let hebrew = "בְּרֵאשִׁ֖ית בָּרָ֣א אֱלֹהִ֑ים";
        assert_eq!(texts(hebrew), hebrew);
    }
}

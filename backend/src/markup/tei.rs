//! TEI converter, for modules encoded with the TEI dictionary/entry
//! vocabulary. Entry-structure tags unwrap to their text; `<w>` carries
//! Strong's lemmas where present; `<note>` subtrees are dropped.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::ConversionResult;

use super::{decode_entities, tokenize, MarkupConverter, Token};

lazy_static! {
    static ref STRONGS_RE: Regex = Regex::new(r"(?:strong:)?([HG]\d+[a-z]?)$").expect("strongs regex");
}

#[derive(Default)]
pub struct TeiConverter;

impl MarkupConverter for TeiConverter {
    fn convert(&self, raw: &str) -> ConversionResult {
        let mut result = ConversionResult::default();
        let mut text = String::with_capacity(raw.len());
        let mut skip_depth: usize = 0;

        for token in tokenize(raw) {
            match token {
                Token::Text(s) => {
                    if skip_depth == 0 {
                        text.push_str(s);
                    }
                }
                Token::Tag(tag) => {
                    let name = tag.name();
                    if name.eq_ignore_ascii_case("note") {
                        if tag.is_closing() {
                            skip_depth = skip_depth.saturating_sub(1);
                        } else if !tag.is_self_closing() {
                            skip_depth += 1;
                        }
                        continue;
                    }
                    if skip_depth > 0 {
                        continue;
                    }

                    if name.eq_ignore_ascii_case("w") && !tag.is_closing() {
                        if let Some(lemma) = tag.attr("lemma") {
                            for part in lemma.split_whitespace() {
                                if let Some(caps) = STRONGS_RE.captures(part) {
                                    result.strongs.push(caps[1].to_string());
                                }
                            }
                        }
                        continue;
                    }

                    // entry, orth, def, sense, pos, etym, gramGrp, ref,
                    // pron, hi and the rest unwrap to their content.
                }
            }
        }

        result.text = decode_entities(text);
        result
    }
}

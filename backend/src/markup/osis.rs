//! OSIS markup converter.
//!
//! Handles the OSIS constructs that occur inside verse text: `<w>` word
//! elements carrying Strong's and morphology attributes, `<note>`
//! subtrees (dropped entirely), `<divineName>` (unwrapped, optionally
//! uppercased), quotes, translator changes, segments, poetry lines,
//! highlights, milestones and verse/chapter markers (all unwrapped).

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::ConversionResult;

use super::{decode_entities, tokenize, MarkupConverter, Token};

lazy_static! {
    static ref STRONGS_RE: Regex = Regex::new(r"strong:([HG]\d+[a-z]?)").expect("strongs regex");
    static ref MORPH_PREFIX_RE: Regex =
        Regex::new(r"^(?:robinson:|strongMorph:|oshm:|packard:)").expect("morph prefix regex");
}

#[derive(Default)]
pub struct OsisConverter {
    /// Uppercase the content of `<divineName>` (small-caps rendering).
    pub uppercase_divine_name: bool,
}

impl MarkupConverter for OsisConverter {
    fn convert(&self, raw: &str) -> ConversionResult {
        let mut result = ConversionResult::default();
        let mut text = String::with_capacity(raw.len());
        let mut skip_depth: usize = 0;
        // Byte offset in `text` where the innermost divineName started.
        let mut divine_start: Option<usize> = None;
        let mut divine_depth: usize = 0;

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
                            for caps in STRONGS_RE.captures_iter(lemma) {
                                result.strongs.push(caps[1].to_string());
                            }
                        }
                        if let Some(morph) = tag.attr("morph") {
                            for code in morph.split_whitespace() {
                                let code = MORPH_PREFIX_RE.replace(code, "");
                                if !code.is_empty() {
                                    result.morph.push(code.into_owned());
                                }
                            }
                        }
                        continue;
                    }

                    if name.eq_ignore_ascii_case("divineName") {
                        if tag.is_closing() {
                            divine_depth = divine_depth.saturating_sub(1);
                            if divine_depth == 0 {
                                if let Some(start) = divine_start.take() {
                                    if self.uppercase_divine_name {
                                        let upper = text[start..].to_uppercase();
                                        text.truncate(start);
                                        text.push_str(&upper);
                                    }
                                }
                            }
                        } else if !tag.is_self_closing() {
                            if divine_depth == 0 {
                                divine_start = Some(text.len());
                            }
                            divine_depth += 1;
                        }
                        continue;
                    }

                    // Everything else is void: q, transChange, seg, l, lg,
                    // hi, title, reference, milestone, verse, chapter, ...
                }
            }
        }

        result.text = decode_entities(text);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(raw: &str) -> ConversionResult {
        OsisConverter::default().convert(raw)
    }

    #[test]
    fn plain_text_round_trips() {
        let input = "In the beginning God created the heaven and the earth.";
        assert_eq!(convert(input).text, input);
    }

    #[test]
    fn word_elements_feed_side_channels() {
        let input = r#"<w lemma="strong:H07225">In the beginning</w> <w lemma="strong:H0430" morph="strongMorph:TH8804">God</w> created"#;
        let result = convert(input);
        assert_eq!(result.text, "In the beginning God created");
        assert_eq!(result.strongs, vec!["H07225", "H0430"]);
        assert_eq!(result.morph, vec!["TH8804"]);
    }

    #[test]
    fn multiple_lemmas_in_one_word() {
        let result = convert(r#"<w lemma="strong:H0853 strong:H08064">the heaven</w>"#);
        assert_eq!(result.strongs, vec!["H0853", "H08064"]);
    }

    #[test]
    fn note_subtree_is_dropped() {
        let input = r#"for they shall be comforted.<note type="study">Or, <hi type="italic">consoled</hi></note> Blessed"#;
        assert_eq!(convert(input).text, "for they shall be comforted. Blessed");
    }

    #[test]
    fn divine_name_unwraps_and_optionally_uppercases() {
        let input = "And the <divineName>Lord</divineName> spake";
        assert_eq!(convert(input).text, "And the Lord spake");

        let upper = OsisConverter {
            uppercase_divine_name: true,
        };
        assert_eq!(upper.convert(input).text, "And the LORD spake");
    }

    #[test]
    fn structural_tags_are_void() {
        let input = r#"<q who="Jesus" marker="">Verily</q> <transChange type="added">I say</transChange> <seg>unto</seg> you<milestone type="x-p"/>"#;
        assert_eq!(convert(input).text, "Verily I say unto you");
    }

    #[test]
    fn entities_decode_after_tag_removal() {
        assert_eq!(convert("mercy &amp; truth"), ConversionResult {
            text: "mercy & truth".to_string(),
            ..Default::default()
        });
    }

    #[test]
    fn unclosed_note_never_panics() {
        let result = convert("<note>dangling footnote");
        assert_eq!(result.text, "");
    }

    #[test]
    fn spacing_is_exact() {
        let input = "a  <w>b</w>   c";
        assert_eq!(convert(input).text, "a  b   c");
    }
}

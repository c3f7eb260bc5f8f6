//! GBF (General Bible Format) converter.
//!
//! GBF tags are case-significant two-letter codes: an uppercase second
//! letter opens (`<FI>`, `<WH1234>`), a lowercase one closes (`<Fi>`,
//! `<Wh>`). `<WH…>`/`<WG…>` carry Strong's numbers, `<WT…>` morphology,
//! `<RF>…<Rf>` footnotes (dropped) and `<RX>…<Rx>` cross-references
//! (dropped). Paired format codes unwrap.

use crate::types::ConversionResult;

use super::{decode_entities, tokenize, MarkupConverter, Token};

#[derive(Default)]
pub struct GbfConverter;

fn strongs_number(name: &str, prefix: char) -> Option<String> {
    let digits = name.strip_prefix('W')?.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}{}", prefix, digits))
}

impl MarkupConverter for GbfConverter {
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

                    // Footnotes and cross-references drop their content.
                    match name {
                        "RF" | "RX" => {
                            skip_depth += 1;
                            continue;
                        }
                        "Rf" | "Rx" => {
                            skip_depth = skip_depth.saturating_sub(1);
                            continue;
                        }
                        _ => {}
                    }
                    if skip_depth > 0 {
                        continue;
                    }

                    if let Some(number) =
                        strongs_number(name, 'H').or_else(|| strongs_number(name, 'G'))
                    {
                        result.strongs.push(number);
                        continue;
                    }

                    if let Some(code) = name.strip_prefix("WT") {
                        if !code.is_empty() {
                            result.morph.push(code.to_string());
                        }
                        continue;
                    }

                    // Format pairs (<FI><Fi>, <FR><Fr>, ...), word-tag
                    // closers (<Wh>, <Wg>, <Wt>) and milestones (<CM>,
                    // <CL>, <CI>) are void.
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
        GbfConverter.convert(raw)
    }

    #[test]
    fn plain_text_round_trips() {
        let input = "And the earth was without form, and void;";
        assert_eq!(convert(input).text, input);
    }

    #[test]
    fn strongs_words_feed_side_channel() {
        let input = "<WH7225>In the beginning<Wh> <WH430>God<Wh> created";
        let result = convert(input);
        assert_eq!(result.text, "In the beginning God created");
        assert_eq!(result.strongs, vec!["H7225", "H430"]);
    }

    #[test]
    fn greek_strongs_and_morphology() {
        let input = "<WG3056>Word<Wg><WTN-NSM>";
        let result = convert(input);
        assert_eq!(result.text, "Word");
        assert_eq!(result.strongs, vec!["G3056"]);
        assert_eq!(result.morph, vec!["N-NSM"]);
    }

    #[test]
    fn footnotes_are_dropped() {
        let input = "two tables of stone<RF>Heb. tables<Rf> written";
        assert_eq!(convert(input).text, "two tables of stone written");
    }

    #[test]
    fn format_codes_unwrap() {
        let input = "<FR>Verily I say unto you<Fr>, <FI>added words<Fi><CM>";
        assert_eq!(convert(input).text, "Verily I say unto you, added words");
    }

    #[test]
    fn malformed_word_tags_are_void_not_strongs() {
        let result = convert("<WHabc>text<Wh>");
        assert!(result.strongs.is_empty());
        assert_eq!(result.text, "text");
    }
}

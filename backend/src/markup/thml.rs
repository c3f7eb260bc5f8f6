//! ThML markup converter.
//!
//! `<sync>` milestones carry the annotations: `type="Strongs"` feeds the
//! Strong's channel, `type="morph"` the morphology channel. `<note>`
//! subtrees are dropped; scripRef, emphasis and heading tags unwrap.

use crate::types::ConversionResult;

use super::{decode_entities, tokenize, MarkupConverter, Token};

#[derive(Default)]
pub struct ThmlConverter;

impl MarkupConverter for ThmlConverter {
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

                    if name.eq_ignore_ascii_case("sync") && !tag.is_closing() {
                        let kind = tag.attr("type").unwrap_or("");
                        let value = tag.attr("value").unwrap_or("");
                        if value.is_empty() {
                            continue;
                        }
                        if kind.eq_ignore_ascii_case("Strongs") {
                            result.strongs.push(value.to_string());
                        } else if kind.eq_ignore_ascii_case("morph") {
                            result.morph.push(value.to_string());
                        }
                        continue;
                    }

                    // scripRef, em, i, b, strong, h1-h6, p, br, foreign,
                    // blockquote and anything else unwrap to their content.
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
        ThmlConverter.convert(raw)
    }

    #[test]
    fn plain_text_round_trips() {
        let input = "And God said, Let there be light: and there was light.";
        assert_eq!(convert(input).text, input);
    }

    #[test]
    fn sync_milestones_feed_side_channels() {
        let input = r#"In the beginning <sync type="Strongs" value="H7225"/> God <sync type="Strongs" value="H430"/><sync type="morph" value="TH8804"/> created"#;
        let result = convert(input);
        assert_eq!(result.text, "In the beginning  God  created");
        assert_eq!(result.strongs, vec!["H7225", "H430"]);
        assert_eq!(result.morph, vec!["TH8804"]);
    }

    #[test]
    fn notes_are_dropped_and_scripref_unwraps() {
        let input = r#"as it is written<note place="foot">See <scripRef passage="Isa.40.3">Isaiah 40:3</scripRef></note> in the prophets"#;
        assert_eq!(convert(input).text, "as it is written in the prophets");

        let inline = r#"see <scripRef passage="Gen.1.1">Genesis 1:1</scripRef> above"#;
        assert_eq!(convert(inline).text, "see Genesis 1:1 above");
    }

    #[test]
    fn emphasis_and_headings_unwrap() {
        let input = "<h3>The Creation</h3><p>God <em>said</em> and it <b>was</b>.</p>";
        assert_eq!(convert(input).text, "The CreationGod said and it was.");
    }

    #[test]
    fn entities_decode() {
        assert_eq!(convert("Alpha &amp; Omega").text, "Alpha & Omega");
    }
}

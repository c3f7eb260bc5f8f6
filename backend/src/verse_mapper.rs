//! Mapping verse coordinates between versification systems.
//!
//! The mapper works from declared coordinate tables only. It never
//! consults the slot formula, and it never guesses: a book absent from
//! the target system, or a system pair with no declared mapping, is a
//! `NoMapping` error rather than a silently unchanged reference.

use std::collections::{HashMap, HashSet};

use crate::error::{ConvertError, Result};
use crate::types::VerseRef;
use crate::versification;

/// How a reference maps between two systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingType {
    /// Same coordinates in both systems.
    Direct,
    /// Same content under a different chapter or verse number.
    Renumber,
    /// The source verse is part of a chapter the target splits.
    Split,
    /// The source chapter is merged into a larger target chapter.
    Merge,
}

fn greek_numbering(system: &str) -> bool {
    matches!(system, "LXX" | "Vulg")
}

fn hebrew_numbering(system: &str) -> bool {
    matches!(system, "KJV" | "KJVA")
}

pub struct VerseMapper {
    /// Declared "from->to" pairs.
    pairs: HashSet<(String, String)>,
    /// Books that exist in the source but have no counterpart in the target.
    missing: HashMap<(String, String), HashSet<String>>,
}

impl VerseMapper {
    pub fn new() -> Self {
        let mut mapper = VerseMapper {
            pairs: HashSet::new(),
            missing: HashMap::new(),
        };
        mapper.register_standard_mappings();
        mapper
    }

    fn register_pair(&mut self, from: &str, to: &str, missing_books: &[&str]) {
        self.pairs.insert((from.to_string(), to.to_string()));
        if !missing_books.is_empty() {
            self.missing.insert(
                (from.to_string(), to.to_string()),
                missing_books.iter().map(|s| s.to_string()).collect(),
            );
        }
    }

    fn register_standard_mappings(&mut self) {
        // Vulgate books with no KJV counterpart.
        let vulg_only = [
            "Tob", "Jdt", "Wis", "Sir", "Bar", "1Macc", "2Macc", "PrMan",
            "1Esd", "2Esd", "AddPs", "EpLao",
        ];
        self.register_pair("Vulg", "KJV", &vulg_only);
        self.register_pair("KJV", "Vulg", &[]);

        let lxx_only = [
            "Tob", "Jdt", "Wis", "Sir", "Bar", "1Macc", "2Macc", "3Macc",
            "4Macc", "Odes", "PssSol", "AddPs",
        ];
        self.register_pair("LXX", "KJV", &lxx_only);
        self.register_pair("KJV", "LXX", &[]);

        // KJVA shares KJV numbering, so the Greek/Latin pairs apply to it
        // as well. Apocrypha shared by KJVA and the Vulgate map directly.
        self.register_pair("Vulg", "KJVA", &["AddPs", "EpLao"]);
        self.register_pair("KJVA", "Vulg", &["AddEsth", "PrAzar", "Sus", "Bel"]);
        self.register_pair("LXX", "KJVA", &["3Macc", "4Macc", "Odes", "PssSol"]);
        self.register_pair("KJVA", "LXX", &[]);
        self.register_pair("KJV", "KJVA", &[]);
        self.register_pair("KJVA", "KJV", &vulg_only);
    }

    /// Maps a reference into the target system.
    pub fn map(&self, verse_ref: &VerseRef, to_system: &str) -> Result<(VerseRef, MappingType)> {
        let from = versification::normalize_versification_name(&verse_ref.system);
        let to = versification::normalize_versification_name(to_system);
        let book = versification::normalize_book_id(&verse_ref.book);

        if from == to {
            return Ok((verse_ref.clone(), MappingType::Direct));
        }

        let no_mapping = || ConvertError::NoMapping {
            from_system: from.clone(),
            to_system: to.clone(),
            book: book.clone(),
            chapter: verse_ref.chapter,
            verse: verse_ref.verse,
        };

        if !self.pairs.contains(&(from.clone(), to.clone())) {
            return Err(no_mapping());
        }

        if let Some(missing) = self.missing.get(&(from.clone(), to.clone())) {
            if missing.contains(&book) {
                return Err(no_mapping());
            }
        }

        // When the target system is registered, the book must exist in it.
        if let Some(target) = versification::get_versification(&to) {
            if !target.contains_book(&book) {
                return Err(no_mapping());
            }
        }

        if book == "Ps" {
            let (chapter, verse, kind) =
                map_psalm(verse_ref.chapter, verse_ref.verse, &from, &to);
            return Ok((VerseRef::new("Ps", chapter, verse, &to), kind));
        }

        Ok((
            VerseRef::new(&book, verse_ref.chapter, verse_ref.verse, &to),
            MappingType::Direct,
        ))
    }

    pub fn map_to_kjv(&self, verse_ref: &VerseRef) -> Result<(VerseRef, MappingType)> {
        self.map(verse_ref, "KJV")
    }

    pub fn map_from_kjv(&self, verse_ref: &VerseRef, to_system: &str) -> Result<(VerseRef, MappingType)> {
        self.map(verse_ref, to_system)
    }
}

impl Default for VerseMapper {
    fn default() -> Self {
        VerseMapper::new()
    }
}

/// Psalm renumbering between the Hebrew (KJV) and Greek/Latin (LXX,
/// Vulgate) traditions.
///
///   - 1-8 identical
///   - KJV 9 and 10 merge into LXX 9
///   - KJV 11-113 sit one lower in LXX (10-112)
///   - KJV 114 and 115 merge into LXX 113
///   - KJV 116 splits into LXX 114 (vv 1-9) and 115 (vv 10-19)
///   - KJV 117-146 sit one lower in LXX (116-145)
///   - KJV 147 splits into LXX 146 (vv 1-11) and 147 (vv 12-20)
///   - 148-150 identical
fn map_psalm(chapter: i32, verse: i32, from: &str, to: &str) -> (i32, i32, MappingType) {
    if hebrew_numbering(from) && greek_numbering(to) {
        return match chapter {
            ..=8 => (chapter, verse, MappingType::Direct),
            9 => (9, verse, MappingType::Direct),
            10 => (9, verse + 21, MappingType::Merge),
            11..=113 => (chapter - 1, verse, MappingType::Renumber),
            114 => (113, verse, MappingType::Merge),
            115 => (113, verse + 8, MappingType::Merge),
            116 => {
                if verse <= 9 {
                    (114, verse, MappingType::Split)
                } else {
                    (115, verse - 9, MappingType::Split)
                }
            }
            117..=146 => (chapter - 1, verse, MappingType::Renumber),
            147 => {
                if verse <= 11 {
                    (146, verse, MappingType::Split)
                } else {
                    (147, verse - 11, MappingType::Split)
                }
            }
            _ => (chapter, verse, MappingType::Direct),
        };
    }

    if greek_numbering(from) && hebrew_numbering(to) {
        return match chapter {
            ..=8 => (chapter, verse, MappingType::Direct),
            9 => {
                if verse <= 21 {
                    (9, verse, MappingType::Direct)
                } else {
                    (10, verse - 21, MappingType::Split)
                }
            }
            10..=112 => (chapter + 1, verse, MappingType::Renumber),
            113 => {
                if verse <= 8 {
                    (114, verse, MappingType::Split)
                } else {
                    (115, verse - 8, MappingType::Split)
                }
            }
            114 => (116, verse, MappingType::Merge),
            115 => (116, verse + 9, MappingType::Merge),
            116..=145 => (chapter + 1, verse, MappingType::Renumber),
            146 => (147, verse, MappingType::Merge),
            147 => (147, verse + 11, MappingType::Merge),
            _ => (chapter, verse, MappingType::Direct),
        };
    }

    (chapter, verse, MappingType::Direct)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> VerseMapper {
        VerseMapper::new()
    }

    #[test]
    fn identity_for_same_system() {
        let m = mapper();
        let r = VerseRef::new("Gen", 1, 1, "KJV");
        let (mapped, kind) = m.map(&r, "KJV").unwrap();
        assert_eq!(mapped, r);
        assert_eq!(kind, MappingType::Direct);
    }

    #[test]
    fn shepherd_psalm_vulg_to_kjv() {
        let m = mapper();
        let r = VerseRef::new("Ps", 22, 1, "Vulg");
        let (mapped, kind) = m.map(&r, "KJV").unwrap();
        assert_eq!(mapped, VerseRef::new("Ps", 23, 1, "KJV"));
        assert_eq!(kind, MappingType::Renumber);
    }

    #[test]
    fn psalm_round_trip_in_renumbered_range() {
        let m = mapper();
        for ch in [11, 50, 113, 117, 146] {
            let r = VerseRef::new("Ps", ch, 3, "KJV");
            let (there, _) = m.map(&r, "Vulg").unwrap();
            let (back, _) = m.map(&there, "KJV").unwrap();
            assert_eq!(back, r, "round trip failed for Ps {}", ch);
        }
    }

    #[test]
    fn psalm_merges_and_splits() {
        let m = mapper();

        // KJV 10 lands in the second half of LXX 9.
        let (mapped, kind) = m.map(&VerseRef::new("Ps", 10, 1, "KJV"), "Vulg").unwrap();
        assert_eq!((mapped.chapter, mapped.verse), (9, 22));
        assert_eq!(kind, MappingType::Merge);

        // KJV 116 splits at verse 10.
        let (a, _) = m.map(&VerseRef::new("Ps", 116, 9, "KJV"), "Vulg").unwrap();
        let (b, _) = m.map(&VerseRef::new("Ps", 116, 10, "KJV"), "Vulg").unwrap();
        assert_eq!((a.chapter, a.verse), (114, 9));
        assert_eq!((b.chapter, b.verse), (115, 1));

        // LXX 147 maps into the tail of KJV 147.
        let (c, _) = m.map(&VerseRef::new("Ps", 147, 1, "Vulg"), "KJV").unwrap();
        assert_eq!((c.chapter, c.verse), (147, 12));

        // Psalms 148-150 agree.
        let (d, kind) = m.map(&VerseRef::new("Ps", 150, 6, "Vulg"), "KJV").unwrap();
        assert_eq!((d.chapter, d.verse), (150, 6));
        assert_eq!(kind, MappingType::Direct);
    }

    #[test]
    fn deuterocanon_to_kjv_has_no_mapping() {
        let m = mapper();
        let err = m.map(&VerseRef::new("Tob", 1, 1, "Vulg"), "KJV").unwrap_err();
        assert!(matches!(err, ConvertError::NoMapping { .. }));
    }

    #[test]
    fn undeclared_pair_has_no_mapping() {
        let m = mapper();
        let err = m
            .map(&VerseRef::new("Gen", 1, 1, "Synodal"), "KJV")
            .unwrap_err();
        assert!(matches!(err, ConvertError::NoMapping { .. }));
    }

    #[test]
    fn shared_apocrypha_map_between_kjva_and_vulg() {
        let m = mapper();
        let (mapped, kind) = m.map(&VerseRef::new("Tob", 1, 1, "Vulg"), "KJVA").unwrap();
        assert_eq!(mapped.book, "Tob");
        assert_eq!(kind, MappingType::Direct);
    }
}

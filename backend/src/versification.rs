use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::error::{ConvertError, Result};
use crate::types::Module;
use crate::{versification_kjv, versification_kjva, versification_vulg};

/// Which testament a book belongs to. Apocrypha/deuterocanonical books
/// live in the OT data file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Testament {
    Ot,
    Nt,
    Ap,
}

impl Testament {
    pub fn as_str(&self) -> &'static str {
        match self {
            Testament::Ot => "OT",
            Testament::Nt => "NT",
            Testament::Ap => "AP",
        }
    }

    /// True if verses of this testament are stored in the NT data file.
    pub fn in_nt_file(&self) -> bool {
        matches!(self, Testament::Nt)
    }
}

/// A book definition within a versification system.
#[derive(Debug, Clone)]
pub struct BookDef {
    pub id: String,
    pub name: String,
    pub abbrev: String,
    pub testament: Testament,
    pub chapter_verse_counts: Vec<i32>,
}

impl BookDef {
    pub fn chapters(&self) -> i32 {
        self.chapter_verse_counts.len() as i32
    }

    /// Verse count of a chapter (1-indexed), 0 if out of range.
    pub fn verses(&self, chapter: i32) -> i32 {
        if chapter < 1 || chapter > self.chapters() {
            return 0;
        }
        self.chapter_verse_counts[(chapter - 1) as usize]
    }

    pub fn total_verses(&self) -> i32 {
        self.chapter_verse_counts.iter().sum()
    }
}

/// Counts of the intro records SWORD interleaves with verse records in
/// the `.bzv` index. These are layout parameters of the index, carried
/// as data so a nonstandard module can override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntroLayout {
    /// Records at the start of each testament file (placeholder + header).
    pub testament_headings: usize,
    /// Records before each book's first chapter.
    pub book_intro: usize,
    /// Records before each chapter's first verse.
    pub chapter_intro: usize,
}

impl Default for IntroLayout {
    fn default() -> Self {
        IntroLayout {
            testament_headings: 2,
            book_intro: 1,
            chapter_intro: 1,
        }
    }
}

/// A complete versification definition: book order, inclusion, and
/// chapter/verse counts. Immutable after registration.
#[derive(Debug, Clone)]
pub struct VersificationSystem {
    pub name: String,
    pub books: Vec<BookDef>,
    pub intro: IntroLayout,
    book_index: HashMap<String, usize>,
}

impl VersificationSystem {
    pub fn new(name: &str, books: Vec<BookDef>, intro: IntroLayout) -> Self {
        let mut book_index = HashMap::new();
        for (i, book) in books.iter().enumerate() {
            book_index.insert(book.id.clone(), i);
        }
        VersificationSystem {
            name: name.to_string(),
            books,
            intro,
            book_index,
        }
    }

    pub fn get_book(&self, book_id: &str) -> Option<&BookDef> {
        self.book_index.get(book_id).map(|&i| &self.books[i])
    }

    pub fn book_position(&self, book_id: &str) -> Option<usize> {
        self.book_index.get(book_id).copied()
    }

    pub fn total_books(&self) -> usize {
        self.books.len()
    }

    pub fn contains_book(&self, book_id: &str) -> bool {
        self.book_index.contains_key(book_id)
    }

    /// Absolute record index of a verse within its testament's data file.
    ///
    /// Each testament file starts with heading records, each book with a
    /// book intro, each chapter with a chapter intro. The NT file counts
    /// only NT predecessors; the OT file interleaves OT and AP books
    /// (the Vulgate places deuterocanon between OT books).
    pub fn verse_slot(&self, book_id: &str, chapter: i32, verse: i32) -> Result<usize> {
        let book = self
            .get_book(book_id)
            .ok_or_else(|| ConvertError::UnknownBook(book_id.to_string()))?;
        let book_pos = self.book_index[book_id];
        let in_nt_file = book.testament.in_nt_file();

        let mut slot = self.intro.testament_headings;

        for prev in &self.books[..book_pos] {
            if prev.testament.in_nt_file() != in_nt_file {
                continue;
            }
            slot += prev.total_verses() as usize
                + prev.chapters() as usize * self.intro.chapter_intro
                + self.intro.book_intro;
        }

        slot += self.intro.book_intro;

        for ch in 1..chapter {
            if ch <= book.chapters() {
                slot += self.intro.chapter_intro + book.verses(ch) as usize;
            }
        }

        slot += self.intro.chapter_intro;
        slot += (verse - 1).max(0) as usize;

        Ok(slot)
    }
}

lazy_static! {
    static ref SYSTEMS: RwLock<HashMap<String, Arc<VersificationSystem>>> = {
        let mut map = HashMap::new();
        for system in [
            versification_kjv::system(),
            versification_kjva::system(),
            versification_vulg::system(),
        ] {
            map.insert(system.name.clone(), Arc::new(system));
        }
        RwLock::new(map)
    };

    static ref BOOK_ALIASES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        for (alias, id) in [
            ("genesis", "Gen"),
            ("exodus", "Exod"),
            ("leviticus", "Lev"),
            ("numbers", "Num"),
            ("deuteronomy", "Deut"),
            ("joshua", "Josh"),
            ("judges", "Judg"),
            ("1 samuel", "1Sam"),
            ("2 samuel", "2Sam"),
            ("1 kings", "1Kgs"),
            ("2 kings", "2Kgs"),
            ("1 chronicles", "1Chr"),
            ("2 chronicles", "2Chr"),
            ("nehemiah", "Neh"),
            ("esther", "Esth"),
            ("psalms", "Ps"),
            ("psalm", "Ps"),
            ("proverbs", "Prov"),
            ("ecclesiastes", "Eccl"),
            ("song of songs", "Song"),
            ("song of solomon", "Song"),
            ("isaiah", "Isa"),
            ("jeremiah", "Jer"),
            ("lamentations", "Lam"),
            ("ezekiel", "Ezek"),
            ("daniel", "Dan"),
            ("hosea", "Hos"),
            ("obadiah", "Obad"),
            ("micah", "Mic"),
            ("nahum", "Nah"),
            ("habakkuk", "Hab"),
            ("zephaniah", "Zeph"),
            ("haggai", "Hag"),
            ("zechariah", "Zech"),
            ("malachi", "Mal"),
            ("matthew", "Matt"),
            ("romans", "Rom"),
            ("1 corinthians", "1Cor"),
            ("2 corinthians", "2Cor"),
            ("galatians", "Gal"),
            ("ephesians", "Eph"),
            ("philippians", "Phil"),
            ("colossians", "Col"),
            ("1 thessalonians", "1Thess"),
            ("2 thessalonians", "2Thess"),
            ("1 timothy", "1Tim"),
            ("2 timothy", "2Tim"),
            ("philemon", "Phlm"),
            ("hebrews", "Heb"),
            ("james", "Jas"),
            ("1 peter", "1Pet"),
            ("2 peter", "2Pet"),
            ("1 john", "1John"),
            ("2 john", "2John"),
            ("3 john", "3John"),
            ("revelation", "Rev"),
            ("revelations", "Rev"),
            ("tobit", "Tob"),
            ("judith", "Jdt"),
            ("wisdom", "Wis"),
            ("sirach", "Sir"),
            ("ecclesiasticus", "Sir"),
            ("baruch", "Bar"),
            ("1 maccabees", "1Macc"),
            ("2 maccabees", "2Macc"),
        ] {
            m.insert(alias, id);
        }
        m
    };
}

/// Adds a versification system to the registry, replacing any previous
/// system with the same name.
pub fn register_versification(system: VersificationSystem) {
    SYSTEMS
        .write()
        .insert(system.name.clone(), Arc::new(system));
}

pub fn get_versification(name: &str) -> Option<Arc<VersificationSystem>> {
    SYSTEMS.read().get(name).cloned()
}

pub fn list_versifications() -> Vec<String> {
    let mut names: Vec<String> = SYSTEMS.read().keys().cloned().collect();
    names.sort();
    names
}

/// Converts common versification aliases to canonical names.
pub fn normalize_versification_name(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "kjv" | "king james" | "protestant" => "KJV".to_string(),
        "kjva" | "kjv with apocrypha" => "KJVA".to_string(),
        "vulg" | "vulgate" | "latin vulgate" => "Vulg".to_string(),
        "lxx" | "septuagint" => "LXX".to_string(),
        "mt" | "masoretic" | "hebrew" => "MT".to_string(),
        "leningrad" => "Leningrad".to_string(),
        "synodal" | "russian" => "Synodal".to_string(),
        "luther" | "german" => "Luther".to_string(),
        "catholic" => "Catholic".to_string(),
        "catholic2" => "Catholic2".to_string(),
        "nrsv" => "NRSV".to_string(),
        "nrsva" => "NRSVA".to_string(),
        "orthodox" => "Orthodox".to_string(),
        _ => name.to_string(),
    }
}

/// Converts a book reference (OSIS ID or common name) to the OSIS ID.
pub fn normalize_book_id(book_ref: &str) -> String {
    if let Some(&id) = BOOK_ALIASES.get(book_ref.to_lowercase().as_str()) {
        return id.to_string();
    }
    book_ref.to_string()
}

/// Returns the versification system declared by a module, falling back
/// to KJV when the declared system is not registered.
pub fn system_for_module(module: &Module) -> Result<Arc<VersificationSystem>> {
    let name = if module.versification.is_empty() {
        "KJV".to_string()
    } else {
        normalize_versification_name(&module.versification)
    };

    if let Some(system) = get_versification(&name) {
        return Ok(system);
    }

    crate::logger::warn(&format!(
        "Module {} declares unregistered versification {}, falling back to KJV",
        module.id, name
    ));
    get_versification("KJV").ok_or(ConvertError::UnknownSystem(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_systems_are_registered() {
        let names = list_versifications();
        assert!(names.contains(&"KJV".to_string()));
        assert!(names.contains(&"KJVA".to_string()));
        assert!(names.contains(&"Vulg".to_string()));
    }

    #[test]
    fn genesis_one_one_is_slot_four() {
        let kjv = get_versification("KJV").unwrap();
        assert_eq!(kjv.verse_slot("Gen", 1, 1).unwrap(), 4);
    }

    #[test]
    fn slots_are_monotonic_within_a_book() {
        let kjv = get_versification("KJV").unwrap();
        let mut prev = 0;
        let genesis = kjv.get_book("Gen").unwrap().clone();
        for ch in 1..=genesis.chapters() {
            for v in 1..=genesis.verses(ch) {
                let slot = kjv.verse_slot("Gen", ch, v).unwrap();
                assert!(slot > prev, "slot {} not after {}", slot, prev);
                prev = slot;
            }
        }
    }

    #[test]
    fn chapter_boundary_skips_one_intro_record() {
        let kjv = get_versification("KJV").unwrap();
        // Gen 1 has 31 verses, so Gen 2:1 sits two records past Gen 1:31.
        let last = kjv.verse_slot("Gen", 1, 31).unwrap();
        let next = kjv.verse_slot("Gen", 2, 1).unwrap();
        assert_eq!(next, last + 2);
    }

    #[test]
    fn nt_file_counts_only_nt_predecessors() {
        let kjv = get_versification("KJV").unwrap();
        // Matt is the first NT book, so its slot layout matches Gen's.
        assert_eq!(kjv.verse_slot("Matt", 1, 1).unwrap(), 4);
    }

    #[test]
    fn vulgate_interleaves_deuterocanon_in_ot_file() {
        let vulg = get_versification("Vulg").unwrap();
        let kjv = get_versification("KJV").unwrap();
        // Tob and Jdt sit between Neh and Esth in the Vulgate OT file, so
        // Esth starts later there than a KJV-only count would put it.
        let vulg_esth = vulg.verse_slot("Esth", 1, 1).unwrap();
        let kjv_esth = kjv.verse_slot("Esth", 1, 1).unwrap();
        assert!(vulg_esth > kjv_esth);
        // NT slots ignore the interleaved apocrypha entirely.
        assert_eq!(vulg.verse_slot("Matt", 1, 1).unwrap(), 4);
    }

    #[test]
    fn unknown_book_is_an_error() {
        let kjv = get_versification("KJV").unwrap();
        assert!(matches!(
            kjv.verse_slot("Nonsense", 1, 1),
            Err(ConvertError::UnknownBook(_))
        ));
    }

    #[test]
    fn intro_layout_is_data() {
        let kjv = get_versification("KJV").unwrap();
        let flat = VersificationSystem::new(
            "KJV-flat",
            kjv.books.clone(),
            IntroLayout {
                testament_headings: 0,
                book_intro: 0,
                chapter_intro: 0,
            },
        );
        assert_eq!(flat.verse_slot("Gen", 1, 1).unwrap(), 0);
        assert_eq!(flat.verse_slot("Gen", 1, 2).unwrap(), 1);
    }

    #[test]
    fn alias_normalization() {
        assert_eq!(normalize_versification_name("vulgate"), "Vulg");
        assert_eq!(normalize_versification_name("KJV"), "KJV");
        assert_eq!(normalize_versification_name("Custom"), "Custom");
        assert_eq!(normalize_book_id("Psalm"), "Ps");
        assert_eq!(normalize_book_id("Gen"), "Gen");
    }
}

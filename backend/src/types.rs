use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of content a SWORD module holds, derived from its driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleType {
    #[serde(rename = "bible")]
    Bible,
    #[serde(rename = "commentary")]
    Commentary,
    #[serde(rename = "dictionary")]
    Dictionary,
    #[serde(rename = "genbook")]
    GenBook,
}

/// SWORD module driver, from the `ModDrv` conf key.
///
/// The driver decides both the on-disk layout and the verse index record
/// width (10 bytes for `ZText`, 12 for `ZText4`). It is declared in the
/// module configuration, never sniffed from file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleDriver {
    ZText,
    ZText4,
    RawGenBook,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unsupported module driver: {0}")]
pub struct ParseDriverError(String);

impl FromStr for ModuleDriver {
    type Err = ParseDriverError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "zText" => Ok(ModuleDriver::ZText),
            "zText4" => Ok(ModuleDriver::ZText4),
            "RawGenBook" => Ok(ModuleDriver::RawGenBook),
            _ => Err(ParseDriverError(s.to_string())),
        }
    }
}

impl ModuleDriver {
    pub fn module_type(&self) -> ModuleType {
        match self {
            ModuleDriver::ZText | ModuleDriver::ZText4 => ModuleType::Bible,
            ModuleDriver::RawGenBook => ModuleType::GenBook,
        }
    }

    /// Verse index record width in bytes.
    pub fn verse_record_width(&self) -> usize {
        match self {
            ModuleDriver::ZText => 10,
            ModuleDriver::ZText4 => 12,
            ModuleDriver::RawGenBook => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleDriver::ZText => "zText",
            ModuleDriver::ZText4 => "zText4",
            ModuleDriver::RawGenBook => "RawGenBook",
        }
    }
}

impl fmt::Display for ModuleDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Markup dialect of the module content, from the `SourceType` conf key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceType {
    Osis,
    Thml,
    Gbf,
    Tei,
    #[default]
    Plain,
}

impl FromStr for SourceType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "osis" => Ok(SourceType::Osis),
            "thml" => Ok(SourceType::Thml),
            "gbf" => Ok(SourceType::Gbf),
            "tei" => Ok(SourceType::Tei),
            "plain" | "plaintext" => Ok(SourceType::Plain),
            _ => Err(()),
        }
    }
}

/// Metadata of a SWORD module, parsed from its `.conf` file.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub id: String,
    pub title: String,
    pub description: String,
    pub about: String,

    pub driver: Option<ModuleDriver>,
    pub source_type: SourceType,
    pub language: String,
    pub versification: String,

    pub features: Vec<String>,
    pub global_option_filters: Vec<String>,

    pub data_path: String,
    pub conf_path: PathBuf,

    pub compress_type: String,
    pub block_type: String,
    pub encoding: String,

    pub version: String,
    pub copyright: String,
    pub distribution_license: String,
    pub category: String,
}

impl Module {
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    pub fn has_strongs(&self) -> bool {
        self.has_feature("StrongsNumbers")
    }

    pub fn has_morphology(&self) -> bool {
        self.global_option_filters.iter().any(|f| f.contains("Morph"))
    }

    /// Absolute path to the module's data directory. SWORD data paths are
    /// written relative to the SWORD root.
    pub fn resolve_data_path(&self, sword_dir: &Path) -> PathBuf {
        let data_path = self.data_path.trim_start_matches("./");
        sword_dir.join(data_path)
    }
}

/// A verse coordinate, meaningful only relative to its versification
/// system. Comparing coordinates across systems requires the verse mapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRef {
    pub book: String,
    pub chapter: i32,
    pub verse: i32,
    pub system: String,
}

impl VerseRef {
    pub fn new(book: &str, chapter: i32, verse: i32, system: &str) -> Self {
        VerseRef {
            book: book.to_string(),
            chapter,
            verse,
            system: system.to_string(),
        }
    }
}

impl fmt::Display for VerseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{} ({})", self.book, self.chapter, self.verse, self.system)
    }
}

/// Parses references like "Gen 1:1", "Gen.1.1" or "1 John 3 16".
pub fn parse_reference(s: &str, system: &str) -> Option<VerseRef> {
    let cleaned = s.trim().replace([':', '.'], " ");
    let mut parts = cleaned.split_whitespace().rev();
    let verse: i32 = parts.next()?.parse().ok()?;
    let chapter: i32 = parts.next()?.parse().ok()?;
    let mut book_parts: Vec<&str> = parts.collect();
    book_parts.reverse();
    if book_parts.is_empty() {
        return None;
    }
    Some(VerseRef::new(&book_parts.join(" "), chapter, verse, system))
}

/// Output of a markup converter: plain text plus the annotations that were
/// embedded in the markup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionResult {
    pub text: String,
    pub strongs: Vec<String>,
    pub morph: Vec<String>,
}

/// A single verse in the canonical document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalVerse {
    pub number: i32,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub strongs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub morphology: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalChapter {
    pub number: i32,
    pub verses: Vec<CanonicalVerse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalBook {
    pub id: String,
    pub name: String,
    pub testament: String,
    pub chapters: Vec<CanonicalChapter>,
}

/// A book that exists in the versification system but has no content in
/// this particular module (e.g. NT books in a Hebrew-only module).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExcludedBook {
    pub id: String,
    pub name: String,
    pub testament: String,
    pub reason: String,
}

/// The canonical tree for one translation, ready for the JSON emitter.
#[derive(Debug, Clone)]
pub struct CanonicalDocument {
    pub id: String,
    pub title: String,
    pub abbrev: String,
    pub lang: String,
    pub versification: String,
    pub license: String,
    pub has_strongs: bool,
    pub tags: Vec<String>,
    pub books: Vec<CanonicalBook>,
    pub excluded_books: Vec<ExcludedBook>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_from_str() {
        assert_eq!("zText".parse::<ModuleDriver>(), Ok(ModuleDriver::ZText));
        assert_eq!("zText4".parse::<ModuleDriver>(), Ok(ModuleDriver::ZText4));
        assert!("zCom".parse::<ModuleDriver>().is_err());
    }

    #[test]
    fn verse_record_width_by_driver() {
        assert_eq!(ModuleDriver::ZText.verse_record_width(), 10);
        assert_eq!(ModuleDriver::ZText4.verse_record_width(), 12);
    }

    #[test]
    fn source_type_is_case_insensitive() {
        assert_eq!("OSIS".parse::<SourceType>(), Ok(SourceType::Osis));
        assert_eq!("ThML".parse::<SourceType>(), Ok(SourceType::Thml));
        assert_eq!("gbf".parse::<SourceType>(), Ok(SourceType::Gbf));
    }

    #[test]
    fn parse_reference_formats() {
        let expected = VerseRef::new("Gen", 1, 1, "KJV");
        assert_eq!(parse_reference("Gen 1:1", "KJV"), Some(expected.clone()));
        assert_eq!(parse_reference("Gen.1.1", "KJV"), Some(expected));

        let multi = parse_reference("1 John 3:16", "KJV").unwrap();
        assert_eq!(multi.book, "1 John");
        assert_eq!(multi.chapter, 3);
        assert_eq!(multi.verse, 16);

        assert_eq!(parse_reference("nonsense", "KJV"), None);
    }
}

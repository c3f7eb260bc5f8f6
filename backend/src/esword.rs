//! Reader for e-Sword `.bblx` Bible modules (SQLite).
//!
//! The `Bible` table holds one row per verse with KJV book numbers
//! 1..=66. `Details` (title, abbreviation, license text) and `Books`
//! (display names) are optional and tolerated when absent. Verse text
//! carries RTF-ish formatting codes which are stripped before markup
//! conversion.

use std::path::{Path, PathBuf};

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;

use crate::error::{ConvertError, Result};
use crate::esword_schema::{bible, books, details};
use crate::types::{
    CanonicalBook, CanonicalChapter, CanonicalDocument, CanonicalVerse,
};
use crate::versification_kjv;
use crate::logger;

lazy_static! {
    static ref RTF_COLOR_RE: Regex = Regex::new(r"\\cf\d+").expect("cf regex");
    static ref RTF_FONT_SIZE_RE: Regex = Regex::new(r"\\fs\d+").expect("fs regex");
    static ref RTF_FONT_RE: Regex = Regex::new(r"\\f\d+").expect("font regex");
    static ref RTF_TOGGLE_RE: Regex =
        Regex::new(r"\\(?:b0|b|i0|i|ul0|ul|super|nosupersub|sub|qc|pard)\b").expect("toggle regex");
    static ref DOUBLED_SPACE_RE: Regex = Regex::new(r" {2,}").expect("space regex");
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibleMetadata {
    pub title: String,
    pub abbreviation: String,
    pub information: String,
    pub version: String,
    pub font: String,
    pub right_to_left: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibleVerse {
    pub book: i32,
    pub chapter: i32,
    pub verse: i32,
    pub scripture: String,
}

pub struct ESwordBible {
    conn: Mutex<SqliteConnection>,
    metadata: BibleMetadata,
    path: PathBuf,
}

impl ESwordBible {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ConvertError::DataNotFound(path.to_path_buf()));
        }
        let url = path.to_string_lossy();
        let mut conn = SqliteConnection::establish(&url)?;
        let metadata = load_metadata(&mut conn, path);
        Ok(ESwordBible {
            conn: Mutex::new(conn),
            metadata,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &BibleMetadata {
        &self.metadata
    }

    /// Raw verse text, RTF codes already stripped. `Ok(None)` when the
    /// verse row is absent.
    pub fn verse(&self, book: i32, chapter: i32, verse: i32) -> Result<Option<BibleVerse>> {
        let mut conn = self.conn.lock();
        let row: Option<Option<String>> = bible::table
            .filter(bible::book.eq(book))
            .filter(bible::chapter.eq(chapter))
            .filter(bible::verse.eq(verse))
            .select(bible::scripture)
            .first(&mut *conn)
            .optional()?;
        Ok(row.map(|scripture| BibleVerse {
            book,
            chapter,
            verse,
            scripture: clean_esword_text(scripture.as_deref().unwrap_or("")),
        }))
    }

    pub fn chapter(&self, book: i32, chapter: i32) -> Result<Vec<BibleVerse>> {
        let mut conn = self.conn.lock();
        let rows: Vec<(i32, Option<String>)> = bible::table
            .filter(bible::book.eq(book))
            .filter(bible::chapter.eq(chapter))
            .order(bible::verse.asc())
            .select((bible::verse, bible::scripture))
            .load(&mut *conn)?;
        Ok(rows
            .into_iter()
            .map(|(verse, scripture)| BibleVerse {
                book,
                chapter,
                verse,
                scripture: clean_esword_text(scripture.as_deref().unwrap_or("")),
            })
            .collect())
    }

    pub fn chapter_count(&self, book: i32) -> Result<i32> {
        let mut conn = self.conn.lock();
        let max: Option<i32> = bible::table
            .filter(bible::book.eq(book))
            .select(diesel::dsl::max(bible::chapter))
            .first(&mut *conn)?;
        Ok(max.unwrap_or(0))
    }

    pub fn verse_count(&self, book: i32, chapter: i32) -> Result<i32> {
        let mut conn = self.conn.lock();
        let max: Option<i32> = bible::table
            .filter(bible::book.eq(book))
            .filter(bible::chapter.eq(chapter))
            .select(diesel::dsl::max(bible::verse))
            .first(&mut *conn)?;
        Ok(max.unwrap_or(0))
    }

    /// Book numbers present in the file, ascending.
    pub fn book_numbers(&self) -> Result<Vec<i32>> {
        let mut conn = self.conn.lock();
        let rows: Vec<i32> = bible::table
            .select(bible::book)
            .distinct()
            .order(bible::book.asc())
            .load(&mut *conn)?;
        Ok(rows)
    }

    /// Display name from the optional `Books` table.
    pub fn book_name(&self, book: i32) -> Option<String> {
        let mut conn = self.conn.lock();
        books::table
            .filter(books::book.eq(book))
            .select(books::long)
            .first::<Option<String>>(&mut *conn)
            .optional()
            .ok()
            .flatten()
            .flatten()
    }

    /// Builds the canonical document tree. Book numbers outside 1..=66
    /// are skipped with a warning; e-Sword modules are always KJV-shaped.
    pub fn to_document(&self, id: &str) -> Result<CanonicalDocument> {
        let kjv = versification_kjv::books();
        let mut doc_books: Vec<CanonicalBook> = Vec::new();

        for book_num in self.book_numbers()? {
            let def = if book_num >= 1 {
                kjv.get(book_num as usize - 1)
            } else {
                None
            };
            let Some(def) = def else {
                logger::warn(&format!(
                    "{}: skipping out-of-canon book number {}",
                    id, book_num
                ));
                continue;
            };

            let mut chapters = Vec::new();
            for chapter_num in 1..=self.chapter_count(book_num)? {
                let verses = self
                    .chapter(book_num, chapter_num)?
                    .into_iter()
                    .map(|v| CanonicalVerse {
                        number: v.verse,
                        text: v.scripture,
                        strongs: Vec::new(),
                        morphology: Vec::new(),
                    })
                    .collect::<Vec<_>>();
                if !verses.is_empty() {
                    chapters.push(CanonicalChapter {
                        number: chapter_num,
                        verses,
                    });
                }
            }
            if chapters.is_empty() {
                continue;
            }

            let name = self.book_name(book_num).unwrap_or_else(|| def.name.clone());
            doc_books.push(CanonicalBook {
                id: def.id.clone(),
                name,
                testament: def.testament.as_str().to_string(),
                chapters,
            });
        }

        let title = if self.metadata.title.is_empty() {
            id.to_string()
        } else {
            self.metadata.title.clone()
        };
        Ok(CanonicalDocument {
            id: id.to_string(),
            title,
            abbrev: self.metadata.abbreviation.clone(),
            lang: String::new(),
            versification: "KJV".to_string(),
            license: self.metadata.information.clone(),
            has_strongs: false,
            tags: Vec::new(),
            books: doc_books,
            excluded_books: Vec::new(),
        })
    }
}

fn load_metadata(conn: &mut SqliteConnection, path: &Path) -> BibleMetadata {
    type DetailsRow = (
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<bool>,
    );
    let row: Option<DetailsRow> = details::table
        .select((
            details::description,
            details::abbreviation,
            details::information,
            details::version,
            details::font,
            details::right_to_left,
        ))
        .first(conn)
        .optional()
        .unwrap_or_default();

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match row {
        Some((description, abbreviation, information, version, font, rtl)) => BibleMetadata {
            title: description.unwrap_or_else(|| stem.clone()),
            abbreviation: abbreviation.unwrap_or_else(|| stem.clone()),
            information: information.unwrap_or_default(),
            version: version.unwrap_or_default(),
            font: font.unwrap_or_default(),
            right_to_left: rtl.unwrap_or(false),
        },
        None => BibleMetadata {
            title: stem.clone(),
            abbreviation: stem,
            ..Default::default()
        },
    }
}

/// Strips the RTF-ish formatting e-Sword embeds in verse text.
/// Paragraph breaks become newlines; font, color, size and toggle codes
/// are removed outright, and runs of spaces the removed codes leave
/// behind collapse to one.
pub fn clean_esword_text(text: &str) -> String {
    let mut s = text.replace("\\par", "\n").replace("\\line", "\n");
    s = RTF_COLOR_RE.replace_all(&s, "").into_owned();
    s = RTF_FONT_SIZE_RE.replace_all(&s, "").into_owned();
    s = RTF_FONT_RE.replace_all(&s, "").into_owned();
    s = RTF_TOGGLE_RE.replace_all(&s, "").into_owned();
    s = DOUBLED_SPACE_RE.replace_all(&s, " ").into_owned();
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::sql_query;

    fn fixture(name: &str, with_details: bool) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cedrus_esword_{}.bblx", name));
        let _ = std::fs::remove_file(&path);
        let mut conn = SqliteConnection::establish(&path.to_string_lossy()).unwrap();

        sql_query(
            "CREATE TABLE Bible (Book INTEGER, Chapter INTEGER, Verse INTEGER, Scripture TEXT)",
        )
        .execute(&mut conn)
        .unwrap();
        sql_query(
            "INSERT INTO Bible VALUES \
             (1, 1, 1, 'In the beginning God created the heaven and the earth.'), \
             (1, 1, 2, '\\cf2 And the earth was without form,\\cf0  and void.'), \
             (43, 3, 16, 'For God so loved the world')",
        )
        .execute(&mut conn)
        .unwrap();

        if with_details {
            sql_query(
                "CREATE TABLE Details (Description TEXT, Abbreviation TEXT, Information TEXT, \
                 Version TEXT, Font TEXT, RightToLeft BOOL)",
            )
            .execute(&mut conn)
            .unwrap();
            sql_query(
                "INSERT INTO Details VALUES \
                 ('Test Bible', 'TST', 'Public Domain', '1.0', '', 0)",
            )
            .execute(&mut conn)
            .unwrap();
        }
        path
    }

    #[test]
    fn reads_verses_and_metadata() {
        let path = fixture("full", true);
        let bible = ESwordBible::open(&path).unwrap();
        assert_eq!(bible.metadata().title, "Test Bible");
        assert_eq!(bible.metadata().abbreviation, "TST");

        let v = bible.verse(1, 1, 1).unwrap().unwrap();
        assert_eq!(
            v.scripture,
            "In the beginning God created the heaven and the earth."
        );
        assert!(bible.verse(1, 50, 1).unwrap().is_none());
    }

    #[test]
    fn missing_details_table_falls_back_to_file_stem() {
        let path = fixture("bare", false);
        let bible = ESwordBible::open(&path).unwrap();
        assert_eq!(bible.metadata().title, "cedrus_esword_bare");
    }

    #[test]
    fn rtf_codes_are_stripped_in_chapter_reads() {
        let path = fixture("rtf", false);
        let bible = ESwordBible::open(&path).unwrap();
        let verses = bible.chapter(1, 1).unwrap();
        assert_eq!(verses.len(), 2);
        assert_eq!(
            verses[1].scripture,
            "And the earth was without form, and void."
        );
    }

    #[test]
    fn document_tree_uses_kjv_book_ids() {
        let path = fixture("doc", true);
        let bible = ESwordBible::open(&path).unwrap();
        let doc = bible.to_document("tst").unwrap();
        assert_eq!(doc.versification, "KJV");
        assert_eq!(doc.books.len(), 2);
        assert_eq!(doc.books[0].id, "Gen");
        assert_eq!(doc.books[0].testament, "OT");
        assert_eq!(doc.books[1].id, "John");
        assert_eq!(doc.books[1].chapters[0].number, 3);
        assert_eq!(doc.books[1].chapters[0].verses[0].number, 16);
    }

    #[test]
    fn clean_text_handles_paragraphs_and_toggles() {
        assert_eq!(
            clean_esword_text("\\b In the beginning\\b0 \\par and then"),
            "In the beginning \n and then"
        );
        assert_eq!(clean_esword_text("\\f1\\fs24 word"), "word");
        assert_eq!(clean_esword_text("plain text"), "plain text");
        // Codes stripped mid-sentence must not leave a doubled space.
        assert_eq!(
            clean_esword_text("without form,\\cf0  and void."),
            "without form, and void."
        );
    }

    #[test]
    fn counts_reflect_stored_rows() {
        let path = fixture("counts", false);
        let bible = ESwordBible::open(&path).unwrap();
        assert_eq!(bible.chapter_count(1).unwrap(), 1);
        assert_eq!(bible.verse_count(1, 1).unwrap(), 2);
        assert_eq!(bible.book_numbers().unwrap(), vec![1, 43]);
    }
}

//! Drives book x chapter x verse extraction for a zText module.
//!
//! Books are processed by a bounded pool of scoped worker threads and
//! merged back in canonical order, so output is deterministic regardless
//! of scheduling. Per-verse failures (`OutOfRange`, `CorruptBlock`)
//! become warnings with an empty placeholder verse; a book with zero
//! non-empty verses is excluded from the document rather than emitted
//! empty.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use lazy_static::lazy_static;
use parking_lot::Mutex;
use regex::Regex;

use crate::error::{ConvertError, Result};
use crate::logger;
use crate::markup::{converter_for, MarkupConverter};
use crate::types::{
    CanonicalBook, CanonicalChapter, CanonicalDocument, CanonicalVerse, ExcludedBook, Module,
};
use crate::versification::BookDef;
use crate::ztext::{TestamentFile, ZTextReader};

lazy_static! {
    // "Genesis 1:1:" style reference placeholders some modules store in
    // verses they do not actually carry.
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"^(?:[1-4]\s*)?[A-Za-z]+\.?\s+\d+[:.]\d+[:.]?\s*$").expect("placeholder regex");
}

#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    /// Worker threads for book-level parallelism.
    pub workers: usize,
    /// Verses shorter than this (after markup conversion) are treated
    /// as missing.
    pub min_verse_len: usize,
    /// Anchor references allowed to fail in `validate_anchors`.
    pub anchor_tolerance: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        ExtractorOptions {
            workers: 4,
            min_verse_len: 3,
            anchor_tolerance: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionWarning {
    pub reference: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub warnings: Vec<ExtractionWarning>,
    pub excluded_books: Vec<ExcludedBook>,
}

pub struct Extraction {
    pub document: CanonicalDocument,
    pub report: ExtractionReport,
}

enum BookOutcome {
    Included(CanonicalBook),
    Excluded(ExcludedBook),
}

/// Extracts a whole zText module into a canonical document.
///
/// Fatal for the module: missing data files, a failed anchor check
/// (`VersificationMismatch`) and cancellation. Everything per-verse is
/// recovered and reported.
pub fn extract_module(
    module: &Module,
    sword_dir: &Path,
    cancel: &AtomicBool,
    options: &ExtractorOptions,
) -> Result<Extraction> {
    let reader = ZTextReader::new(module.clone(), sword_dir)?;
    reader.validate_anchors(options.anchor_tolerance)?;

    let system = reader.versification().clone();
    let converter = converter_for(module.source_type);

    let books = &system.books;
    let worker_count = options.workers.clamp(1, books.len().max(1));

    let next_book = AtomicUsize::new(0);
    let outcomes: Mutex<Vec<(usize, BookOutcome)>> = Mutex::new(Vec::with_capacity(books.len()));
    let warnings: Mutex<Vec<ExtractionWarning>> = Mutex::new(Vec::new());
    let fatal: Mutex<Option<ConvertError>> = Mutex::new(None);

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            scope.spawn(|| loop {
                if cancel.load(Ordering::Relaxed) || fatal.lock().is_some() {
                    return;
                }
                let index = next_book.fetch_add(1, Ordering::Relaxed);
                let Some(book) = books.get(index) else {
                    return;
                };
                match extract_book(&reader, converter.as_ref(), book, cancel, options, &warnings)
                {
                    Ok(outcome) => outcomes.lock().push((index, outcome)),
                    Err(err) => {
                        let mut slot = fatal.lock();
                        if slot.is_none() {
                            *slot = Some(err);
                        }
                        return;
                    }
                }
            });
        }
    });

    if let Some(err) = fatal.lock().take() {
        return Err(err);
    }
    if cancel.load(Ordering::Relaxed) {
        return Err(ConvertError::Cancelled);
    }

    let mut outcomes = outcomes.into_inner();
    outcomes.sort_by_key(|(index, _)| *index);

    let mut doc_books = Vec::new();
    let mut excluded_books = Vec::new();
    for (_, outcome) in outcomes {
        match outcome {
            BookOutcome::Included(book) => doc_books.push(book),
            BookOutcome::Excluded(excluded) => excluded_books.push(excluded),
        }
    }

    let report = ExtractionReport {
        warnings: warnings.into_inner(),
        excluded_books,
    };
    if !report.warnings.is_empty() {
        logger::info(&format!(
            "{}: extracted with {} warnings, {} excluded books",
            module.id,
            report.warnings.len(),
            report.excluded_books.len()
        ));
    }

    let mut tags = Vec::new();
    if module.has_strongs() {
        tags.push("strongs".to_string());
    }
    if module.has_morphology() {
        tags.push("morphology".to_string());
    }

    let document = CanonicalDocument {
        id: module.id.clone(),
        title: module.title.clone(),
        abbrev: module.id.clone(),
        lang: module.language.clone(),
        versification: module.versification.clone(),
        license: module.distribution_license.clone(),
        has_strongs: module.has_strongs(),
        tags,
        books: doc_books,
        excluded_books: report.excluded_books.clone(),
    };

    Ok(Extraction { document, report })
}

fn extract_book(
    reader: &ZTextReader,
    converter: &(dyn MarkupConverter + Send + Sync),
    book: &BookDef,
    cancel: &AtomicBool,
    options: &ExtractorOptions,
    warnings: &Mutex<Vec<ExtractionWarning>>,
) -> Result<BookOutcome> {
    let file = TestamentFile::for_testament(book.testament);
    if !reader.has_testament(file) {
        return Ok(BookOutcome::Excluded(ExcludedBook {
            id: book.id.clone(),
            name: book.name.clone(),
            testament: book.testament.as_str().to_string(),
            reason: format!("module has no {} data file", file.prefix()),
        }));
    }

    let mut chapters = Vec::new();
    let mut non_empty = 0usize;

    for chapter in 1..=book.chapters() {
        let mut verses = Vec::new();
        for verse in 1..=book.verses(chapter) {
            if cancel.load(Ordering::Relaxed) {
                return Err(ConvertError::Cancelled);
            }

            let text = match reader.verse_text(&book.id, chapter, verse) {
                Ok(raw) => {
                    let converted = converter.convert(&raw);
                    if is_missing_text(&converted.text, options.min_verse_len) {
                        CanonicalVerse {
                            number: verse,
                            text: String::new(),
                            strongs: Vec::new(),
                            morphology: Vec::new(),
                        }
                    } else {
                        non_empty += 1;
                        CanonicalVerse {
                            number: verse,
                            text: converted.text,
                            strongs: converted.strongs,
                            morphology: converted.morph,
                        }
                    }
                }
                Err(err) if err.is_verse_recoverable() => {
                    let reference = format!("{} {}:{}", book.id, chapter, verse);
                    logger::debug(&format!("{}: {}", reference, err));
                    warnings.lock().push(ExtractionWarning {
                        reference,
                        message: err.to_string(),
                    });
                    CanonicalVerse {
                        number: verse,
                        text: String::new(),
                        strongs: Vec::new(),
                        morphology: Vec::new(),
                    }
                }
                Err(err) => return Err(err),
            };
            verses.push(text);
        }
        chapters.push(CanonicalChapter {
            number: chapter,
            verses,
        });
    }

    if non_empty == 0 {
        return Ok(BookOutcome::Excluded(ExcludedBook {
            id: book.id.clone(),
            name: book.name.clone(),
            testament: book.testament.as_str().to_string(),
            reason: "no non-empty verses".to_string(),
        }));
    }

    Ok(BookOutcome::Included(CanonicalBook {
        id: book.id.clone(),
        name: book.name.clone(),
        testament: book.testament.as_str().to_string(),
        chapters,
    }))
}

/// Empty text, below-minimum text and bare reference placeholders
/// ("Genesis 1:1:") all count as missing.
fn is_missing_text(text: &str, min_len: usize) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() < min_len {
        return true;
    }
    PLACEHOLDER_RE.is_match(trimmed)
}

//! Deterministic two-file JSON output.
//!
//! `bibles.json` is the index the site layer reads first; one
//! `bibles_auxiliary/{id}.json` per module carries the full book tree.
//! Key order is fixed by struct field order, files are pretty-printed
//! with a trailing newline, and the `generated` stamp is injected by the
//! caller, so repeated runs over unchanged input are byte-identical.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::types::{CanonicalBook, CanonicalDocument};

pub const AUXILIARY_DIR: &str = "bibles_auxiliary";
pub const INDEX_FILE: &str = "bibles.json";

#[derive(Debug, Clone, Serialize)]
pub struct OutputMeta {
    pub granularity: String,
    pub generated: String,
    pub version: String,
}

impl OutputMeta {
    pub fn new(generated: impl Into<String>) -> Self {
        OutputMeta {
            granularity: "verse".to_string(),
            generated: generated.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct BibleSummary {
    id: String,
    title: String,
    abbrev: String,
    lang: String,
    versification: String,
    license: String,
    has_strongs: bool,
    tags: Vec<String>,
}

#[derive(Serialize)]
struct BiblesIndex<'a> {
    bibles: Vec<BibleSummary>,
    meta: &'a OutputMeta,
}

#[derive(Serialize)]
struct AuxiliaryFile<'a> {
    books: &'a [CanonicalBook],
}

pub struct JsonWriter {
    out_dir: PathBuf,
}

impl JsonWriter {
    pub fn new(out_dir: &Path) -> Self {
        JsonWriter {
            out_dir: out_dir.to_path_buf(),
        }
    }

    /// Writes the index and one auxiliary file per document, replacing
    /// whatever a previous run left behind. Documents are sorted by id so
    /// the index order does not depend on extraction order. Returns the
    /// paths written.
    pub fn write(&self, documents: &[CanonicalDocument], meta: &OutputMeta) -> Result<Vec<PathBuf>> {
        let aux_dir = self.out_dir.join(AUXILIARY_DIR);
        fs::create_dir_all(&aux_dir)?;

        let mut documents: Vec<&CanonicalDocument> = documents.iter().collect();
        documents.sort_by(|a, b| a.id.cmp(&b.id));

        let mut written = Vec::new();
        let mut summaries = Vec::new();
        for doc in documents {
            let aux_path = aux_dir.join(format!("{}.json", doc.id));
            write_pretty(&aux_path, &AuxiliaryFile { books: &doc.books })?;
            written.push(aux_path);
            summaries.push(summarize(doc));
        }

        let index_path = self.out_dir.join(INDEX_FILE);
        write_pretty(
            &index_path,
            &BiblesIndex {
                bibles: summaries,
                meta,
            },
        )?;
        written.push(index_path);
        Ok(written)
    }
}

fn summarize(doc: &CanonicalDocument) -> BibleSummary {
    BibleSummary {
        id: doc.id.clone(),
        title: doc.title.clone(),
        abbrev: doc.abbrev.clone(),
        lang: doc.lang.clone(),
        versification: site_versification(&doc.versification),
        license: doc.license.clone(),
        has_strongs: doc.has_strongs,
        tags: doc.tags.clone(),
    }
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

/// Maps SWORD versification names to the site-facing vocabulary.
pub fn site_versification(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "kjv" | "kjva" | "nrsv" | "nrsva" => "protestant".to_string(),
        "vulg" | "catholic" | "catholic2" => "catholic".to_string(),
        "lxx" | "orthodox" | "synodal" => "orthodox".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CanonicalChapter, CanonicalVerse};

    fn sample_doc(id: &str) -> CanonicalDocument {
        CanonicalDocument {
            id: id.to_string(),
            title: format!("{} Title", id),
            abbrev: id.to_uppercase(),
            lang: "en".to_string(),
            versification: "KJV".to_string(),
            license: "Public Domain".to_string(),
            has_strongs: false,
            tags: Vec::new(),
            books: vec![CanonicalBook {
                id: "Gen".to_string(),
                name: "Genesis".to_string(),
                testament: "OT".to_string(),
                chapters: vec![CanonicalChapter {
                    number: 1,
                    verses: vec![CanonicalVerse {
                        number: 1,
                        text: "In the beginning".to_string(),
                        strongs: Vec::new(),
                        morphology: Vec::new(),
                    }],
                }],
            }],
            excluded_books: Vec::new(),
        }
    }

    fn temp_out(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cedrus_json_{}", name));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn writes_index_and_auxiliary_files() {
        let out = temp_out("layout");
        let meta = OutputMeta::new("2024-01-01T00:00:00Z");
        let written = JsonWriter::new(&out)
            .write(&[sample_doc("kjv")], &meta)
            .unwrap();

        assert_eq!(written.len(), 2);
        assert!(out.join("bibles_auxiliary/kjv.json").is_file());

        let index = fs::read_to_string(out.join("bibles.json")).unwrap();
        assert!(index.contains("\"hasStrongs\": false"));
        assert!(index.contains("\"granularity\": \"verse\""));
        assert!(index.ends_with('\n'));
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let out = temp_out("determinism");
        let meta = OutputMeta::new("2024-01-01T00:00:00Z");
        let docs = [sample_doc("b_second"), sample_doc("a_first")];

        JsonWriter::new(&out).write(&docs, &meta).unwrap();
        let first = fs::read_to_string(out.join("bibles.json")).unwrap();
        JsonWriter::new(&out).write(&docs, &meta).unwrap();
        let second = fs::read_to_string(out.join("bibles.json")).unwrap();

        assert_eq!(first, second);
        // Sorted by id regardless of input order.
        assert!(first.find("a_first").unwrap() < first.find("b_second").unwrap());
    }

    #[test]
    fn empty_annotation_lists_are_omitted() {
        let out = temp_out("annotations");
        let meta = OutputMeta::new("2024-01-01T00:00:00Z");
        JsonWriter::new(&out)
            .write(&[sample_doc("kjv")], &meta)
            .unwrap();
        let aux = fs::read_to_string(out.join("bibles_auxiliary/kjv.json")).unwrap();
        assert!(!aux.contains("strongs"));
        assert!(!aux.contains("morphology"));
    }

    #[test]
    fn versification_names_use_site_vocabulary() {
        assert_eq!(site_versification("KJV"), "protestant");
        assert_eq!(site_versification("Vulg"), "catholic");
        assert_eq!(site_versification("LXX"), "orthodox");
        assert_eq!(site_versification("Luther"), "luther");
    }
}

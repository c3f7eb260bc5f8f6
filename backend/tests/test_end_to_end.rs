use std::sync::atomic::AtomicBool;

use cedrus_backend::extractor::{extract_module, ExtractorOptions};
use cedrus_backend::json_output::{JsonWriter, OutputMeta};

mod helpers;
use helpers::{anchor_verses, build_ztext_module};

#[test]
fn synthetic_module_extracts_to_canonical_document() {
    let (sword_dir, module) = build_ztext_module("e2e", &anchor_verses());
    let cancel = AtomicBool::new(false);
    let options = ExtractorOptions::default();

    let extraction = extract_module(&module, &sword_dir, &cancel, &options).unwrap();
    let doc = &extraction.document;

    assert_eq!(doc.id, "e2e");
    assert_eq!(doc.versification, "KJV");

    let genesis = doc.books.iter().find(|b| b.id == "Gen").unwrap();
    assert_eq!(genesis.testament, "OT");
    assert_eq!(
        genesis.chapters[0].verses[0].text,
        "In the beginning God created the heaven and the earth."
    );

    let john = doc.books.iter().find(|b| b.id == "John").unwrap();
    assert_eq!(john.testament, "NT");
    let ch3 = john.chapters.iter().find(|c| c.number == 3).unwrap();
    let v16 = ch3.verses.iter().find(|v| v.number == 16).unwrap();
    assert!(v16.text.starts_with("For God so loved the world"));

    // Books with no fixture content are excluded, never emitted empty.
    assert!(doc.books.iter().all(|b| {
        b.chapters
            .iter()
            .any(|c| c.verses.iter().any(|v| !v.text.is_empty()))
    }));
    assert_eq!(doc.books.len() + doc.excluded_books.len(), 66);
}

#[test]
fn repeated_conversions_produce_identical_files() {
    let (sword_dir, module) = build_ztext_module("determinism", &anchor_verses());
    let cancel = AtomicBool::new(false);
    let options = ExtractorOptions::default();

    let out = std::env::temp_dir().join("cedrus_it_determinism_out");
    let _ = std::fs::remove_dir_all(&out);
    let meta = OutputMeta::new("2024-06-01T00:00:00Z");
    let writer = JsonWriter::new(&out);

    let first_doc = extract_module(&module, &sword_dir, &cancel, &options)
        .unwrap()
        .document;
    writer.write(std::slice::from_ref(&first_doc), &meta).unwrap();
    let first_index = std::fs::read_to_string(out.join("bibles.json")).unwrap();
    let first_aux =
        std::fs::read_to_string(out.join("bibles_auxiliary/determinism.json")).unwrap();

    let second_doc = extract_module(&module, &sword_dir, &cancel, &options)
        .unwrap()
        .document;
    writer.write(std::slice::from_ref(&second_doc), &meta).unwrap();
    let second_index = std::fs::read_to_string(out.join("bibles.json")).unwrap();
    let second_aux =
        std::fs::read_to_string(out.join("bibles_auxiliary/determinism.json")).unwrap();

    assert_eq!(first_index, second_index);
    assert_eq!(first_aux, second_aux);
    assert!(first_index.contains("\"versification\": \"protestant\""));
}

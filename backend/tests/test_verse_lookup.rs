use cedrus_backend::types::parse_reference;
use cedrus_backend::ztext::ZTextReader;

mod helpers;
use helpers::{anchor_verses, build_ztext_module};

#[test]
fn anchor_references_resolve() {
    let (sword_dir, module) = build_ztext_module("anchors", &anchor_verses());
    let reader = ZTextReader::new(module, &sword_dir).unwrap();
    reader.validate_anchors(0).unwrap();
}

#[test]
fn parsed_references_read_the_right_verse() {
    let (sword_dir, module) = build_ztext_module("lookup", &anchor_verses());
    let reader = ZTextReader::new(module, &sword_dir).unwrap();

    for reference in ["John 3:16", "John.3.16", "John 3 16"] {
        let verse_ref = parse_reference(reference, "KJV").unwrap();
        let text = reader.verse_text_at(&verse_ref).unwrap();
        assert!(text.starts_with("For God so loved the world"), "{}", reference);
    }
}

#[test]
fn repeated_reads_hit_the_block_cache() {
    let (sword_dir, module) = build_ztext_module("cache", &anchor_verses());
    let reader = ZTextReader::new(module, &sword_dir).unwrap();

    let first = reader.verse_text("Gen", 1, 1).unwrap();
    let second = reader.verse_text("Gen", 1, 1).unwrap();
    assert_eq!(first, second);

    reader.clear_cache();
    let third = reader.verse_text("Gen", 1, 1).unwrap();
    assert_eq!(first, third);
}

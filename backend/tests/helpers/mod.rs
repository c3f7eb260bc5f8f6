use std::fs;
use std::io::Write;
use std::path::PathBuf;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use cedrus_backend::conf::parse_conf;
use cedrus_backend::types::Module;
use cedrus_backend::versification::get_versification;

/// A verse to place in a synthetic module: (book, chapter, verse, text).
pub type FixtureVerse<'a> = (&'a str, i32, i32, &'a str);

/// Builds a complete zText module under a temp SWORD directory: a
/// `mods.d/{name}.conf` and the six data files (ot/nt x bzs/bzv/bzz),
/// with the given verses at their KJV slots and zero-length records
/// everywhere else. Returns the SWORD dir and the parsed module.
pub fn build_ztext_module(name: &str, verses: &[FixtureVerse]) -> (PathBuf, Module) {
    let sword_dir = std::env::temp_dir().join(format!("cedrus_it_{}", name));
    let _ = fs::remove_dir_all(&sword_dir);
    let mods_d = sword_dir.join("mods.d");
    let data_dir = sword_dir.join(format!("modules/texts/ztext/{}", name));
    fs::create_dir_all(&mods_d).unwrap();
    fs::create_dir_all(&data_dir).unwrap();

    let conf = format!(
        "[{name}]\n\
         DataPath=./modules/texts/ztext/{name}/\n\
         ModDrv=zText\n\
         SourceType=OSIS\n\
         Versification=KJV\n\
         Lang=en\n\
         Description=Synthetic fixture\n\
         About=Synthetic fixture for integration tests\n\
         CompressType=ZIP\n\
         BlockType=BOOK\n"
    );
    let conf_path = mods_d.join(format!("{}.conf", name));
    fs::write(&conf_path, conf).unwrap();

    let system = get_versification("KJV").unwrap();

    // Split verses by testament file and compute slots.
    let mut ot: Vec<(usize, &str)> = Vec::new();
    let mut nt: Vec<(usize, &str)> = Vec::new();
    for &(book, chapter, verse, text) in verses {
        let slot = system.verse_slot(book, chapter, verse).unwrap();
        let def = system.get_book(book).unwrap();
        if def.testament.in_nt_file() {
            nt.push((slot, text));
        } else {
            ot.push((slot, text));
        }
    }

    write_testament(&data_dir, "ot", &ot);
    write_testament(&data_dir, "nt", &nt);

    let module = parse_conf(&conf_path).unwrap();
    (sword_dir, module)
}

fn write_testament(data_dir: &std::path::Path, prefix: &str, slotted: &[(usize, &str)]) {
    let mut block = Vec::new();
    let mut records: Vec<(u32, u32)> = Vec::new();
    for &(_, text) in slotted {
        records.push((block.len() as u32, text.len() as u32));
        block.extend_from_slice(text.as_bytes());
    }

    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(&block).unwrap();
    let compressed = enc.finish().unwrap();

    let mut bzs = Vec::new();
    bzs.extend_from_slice(&0u32.to_le_bytes());
    bzs.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
    bzs.extend_from_slice(&(block.len() as u32).to_le_bytes());

    let max_slot = slotted.iter().map(|&(slot, _)| slot).max().unwrap_or(0);
    let mut bzv = Vec::new();
    for slot in 0..=max_slot {
        let record = slotted
            .iter()
            .position(|&(s, _)| s == slot)
            .map(|i| records[i]);
        let (start, len) = record.unwrap_or((0, 0));
        bzv.extend_from_slice(&0u32.to_le_bytes());
        bzv.extend_from_slice(&start.to_le_bytes());
        bzv.extend_from_slice(&(len as u16).to_le_bytes());
    }

    fs::write(data_dir.join(format!("{}.bzs", prefix)), &bzs).unwrap();
    fs::write(data_dir.join(format!("{}.bzv", prefix)), &bzv).unwrap();
    fs::write(data_dir.join(format!("{}.bzz", prefix)), &compressed).unwrap();
}

/// The four anchor references with plain KJV text, enough for
/// `validate_anchors` to pass with zero tolerance.
#[allow(dead_code)]
pub fn anchor_verses() -> Vec<FixtureVerse<'static>> {
    vec![
        ("Gen", 1, 1, "In the beginning God created the heaven and the earth."),
        ("Ps", 23, 1, "The LORD is my shepherd; I shall not want."),
        ("John", 3, 16, "For God so loved the world, that he gave his only begotten Son."),
        ("Rev", 22, 21, "The grace of our Lord Jesus Christ be with you all. Amen."),
    ]
}

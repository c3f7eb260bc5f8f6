//! Reader for RawGenBook modules (general books: commentaries,
//! devotionals, non-biblical texts).
//!
//! Three files, conventionally named after the module id:
//!   - `.idx`: 4-byte little-endian offsets into `.bdt`, one per entry
//!   - `.dat`: TreeKey records (8 bytes of `0xFF` marker, metadata
//!     bytes, then a null-terminated UTF-8 key)
//!   - `.bdt`: raw entry content
//!
//! Entry sizes come from consecutive offsets (the last entry runs to
//! the end of `.bdt`). Content is returned raw; callers pick a markup
//! converter from the module's `SourceType` just as for Bibles.

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};
use crate::types::Module;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenBookEntry {
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenBookContent {
    pub key: String,
    pub content: String,
}

pub struct RawGenBookReader {
    module: Module,
    entries: HashMap<String, GenBookEntry>,
    keys: Vec<String>,
    bdt_path: PathBuf,
}

impl RawGenBookReader {
    pub fn new(module: Module, sword_dir: &Path) -> Result<Self> {
        let data_path = module.resolve_data_path(sword_dir);
        let (idx_path, dat_path, bdt_path) = locate_files(&data_path, &module.id)?;

        let idx_data = fs::read(&idx_path)?;
        let dat_data = fs::read(&dat_path)?;

        let offsets: Vec<u32> = idx_data
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        if offsets.is_empty() {
            return Err(ConvertError::InvalidConf {
                path: idx_path,
                reason: "empty index file".to_string(),
            });
        }

        let bdt_len = fs::metadata(&bdt_path).map(|m| m.len() as u32).unwrap_or(0);
        let sizes: Vec<u32> = offsets
            .iter()
            .enumerate()
            .map(|(i, &off)| match offsets.get(i + 1) {
                Some(&next) => next.saturating_sub(off),
                None => bdt_len.saturating_sub(off),
            })
            .collect();

        let mut entries = parse_tree_keys(&dat_data, &offsets, &sizes);
        if entries.is_empty() {
            entries = parse_simple_keys(&dat_data, &offsets, &sizes);
        }

        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();

        Ok(RawGenBookReader {
            module,
            entries,
            keys,
            bdt_path,
        })
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// All entry keys, sorted for deterministic iteration.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Reads one entry by key; falls back to a case-insensitive match.
    pub fn entry(&self, key: &str) -> Result<GenBookContent> {
        let (found_key, entry) = match self.entries.get_key_value(key) {
            Some((k, e)) => (k.clone(), *e),
            None => self
                .entries
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(k, e)| (k.clone(), *e))
                .ok_or_else(|| ConvertError::UnknownBook(key.to_string()))?,
        };

        let content = self.read_content(entry)?;
        Ok(GenBookContent {
            key: found_key,
            content,
        })
    }

    pub fn all_entries(&self) -> Vec<GenBookContent> {
        self.keys
            .iter()
            .filter_map(|key| self.entry(key).ok())
            .collect()
    }

    pub fn search_keys(&self, pattern: &str) -> Vec<String> {
        let pattern = pattern.to_lowercase();
        self.keys
            .iter()
            .filter(|k| k.to_lowercase().contains(&pattern))
            .cloned()
            .collect()
    }

    fn read_content(&self, entry: GenBookEntry) -> Result<String> {
        let mut file = fs::File::open(&self.bdt_path)?;
        file.seek(SeekFrom::Start(entry.offset as u64))?;
        let mut data = vec![0u8; entry.size as usize];
        let n = file.read(&mut data)?;
        let trimmed: &[u8] = {
            let mut end = n;
            while end > 0 && data[end - 1] == 0 {
                end -= 1;
            }
            &data[..end]
        };
        Ok(String::from_utf8_lossy(trimmed).into_owned())
    }
}

fn locate_files(data_path: &Path, module_id: &str) -> Result<(PathBuf, PathBuf, PathBuf)> {
    let base = module_id.to_lowercase();
    let candidates = [base.clone(), base.replace(' ', ""), base.replace('-', "")];

    for name in &candidates {
        let idx = data_path.join(format!("{}.idx", name));
        if idx.is_file() {
            return Ok((
                idx,
                data_path.join(format!("{}.dat", name)),
                data_path.join(format!("{}.bdt", name)),
            ));
        }
    }

    // Any .idx in the directory.
    if let Ok(dir) = fs::read_dir(data_path) {
        for entry in dir.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("idx") {
                let dat = path.with_extension("dat");
                let bdt = path.with_extension("bdt");
                return Ok((path, dat, bdt));
            }
        }
    }

    Err(ConvertError::DataNotFound(data_path.to_path_buf()))
}

fn is_printable_start(b: u8) -> bool {
    (0x20..=0x7E).contains(&b) || (0xC0..=0xFD).contains(&b)
}

/// Walks `.dat` looking for 8-byte `0xFF` markers, skipping the metadata
/// bytes after each one, and reading the null-terminated key.
fn parse_tree_keys(
    dat: &[u8],
    offsets: &[u32],
    sizes: &[u32],
) -> HashMap<String, GenBookEntry> {
    let mut entries = HashMap::new();
    let mut pos = 0;
    let mut index = 0;

    while pos < dat.len() && index < offsets.len() {
        if pos + 8 <= dat.len() && dat[pos..pos + 8].iter().all(|&b| b == 0xFF) {
            pos += 8;

            let mut key_start = pos;
            while key_start < dat.len() && (dat[key_start] == 0x00 || dat[key_start] == 0xFF) {
                key_start += 1;
            }
            let mut meta_end = key_start;
            while meta_end < dat.len() && meta_end < key_start + 20 {
                if is_printable_start(dat[meta_end]) {
                    break;
                }
                meta_end += 1;
            }

            let mut key_end = meta_end;
            while key_end < dat.len() && dat[key_end] != 0x00 {
                key_end += 1;
            }

            if key_end > meta_end {
                let key = String::from_utf8_lossy(&dat[meta_end..key_end])
                    .trim()
                    .to_string();
                if !key.is_empty() {
                    entries.insert(
                        key,
                        GenBookEntry {
                            offset: offsets[index],
                            size: sizes[index],
                        },
                    );
                    index += 1;
                }
            }

            pos = key_end + 1;
            continue;
        }
        pos += 1;
    }

    entries
}

/// Fallback for `.dat` files without the marker structure: every
/// null-terminated run that looks like text is a key.
fn parse_simple_keys(
    dat: &[u8],
    offsets: &[u32],
    sizes: &[u32],
) -> HashMap<String, GenBookEntry> {
    let mut entries = HashMap::new();
    let mut keys = Vec::new();
    let mut start = 0;

    for (i, &b) in dat.iter().enumerate() {
        if b == 0x00 {
            if i > start && looks_like_text(&dat[start..i]) {
                let key = String::from_utf8_lossy(&dat[start..i]).trim().to_string();
                if key.len() > 1 {
                    keys.push(key);
                }
            }
            start = i + 1;
        }
    }

    for (i, key) in keys.into_iter().enumerate() {
        if i < offsets.len() {
            entries.insert(
                key,
                GenBookEntry {
                    offset: offsets[i],
                    size: sizes[i],
                },
            );
        }
    }

    entries
}

fn looks_like_text(data: &[u8]) -> bool {
    if data.len() < 2 {
        return false;
    }
    let printable = data
        .iter()
        .filter(|&&b| (0x20..=0x7E).contains(&b) || b >= 0x80)
        .count();
    printable * 2 >= data.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModuleDriver;

    fn write_fixture(name: &str, entries: &[(&str, &str)]) -> (Module, PathBuf) {
        let sword_dir = std::env::temp_dir().join(format!("cedrus_genbook_{}", name));
        let data_dir = sword_dir.join("modules/genbook/rawgenbook/test/");
        fs::create_dir_all(&data_dir).unwrap();

        let mut idx = Vec::new();
        let mut dat = Vec::new();
        let mut bdt = Vec::new();
        for (key, content) in entries {
            idx.extend_from_slice(&(bdt.len() as u32).to_le_bytes());
            dat.extend_from_slice(&[0xFF; 8]);
            dat.extend_from_slice(&[0x00; 4]);
            dat.extend_from_slice(key.as_bytes());
            dat.push(0x00);
            bdt.extend_from_slice(content.as_bytes());
        }
        fs::write(data_dir.join("test.idx"), &idx).unwrap();
        fs::write(data_dir.join("test.dat"), &dat).unwrap();
        fs::write(data_dir.join("test.bdt"), &bdt).unwrap();

        let module = Module {
            id: "test".to_string(),
            driver: Some(ModuleDriver::RawGenBook),
            data_path: "./modules/genbook/rawgenbook/test/".to_string(),
            ..Default::default()
        };
        (module, sword_dir)
    }

    #[test]
    fn reads_entries_by_key() {
        let (module, dir) = write_fixture(
            "basic",
            &[("Chapter 1", "In the first year"), ("Chapter 2", "And it came to pass")],
        );
        let reader = RawGenBookReader::new(module, &dir).unwrap();
        assert_eq!(reader.entry_count(), 2);
        assert_eq!(
            reader.entry("Chapter 1").unwrap().content,
            "In the first year"
        );
        assert_eq!(
            reader.entry("chapter 2").unwrap().content,
            "And it came to pass"
        );
    }

    #[test]
    fn keys_are_sorted() {
        let (module, dir) = write_fixture("sorted", &[("Zebra", "z"), ("Alpha", "a")]);
        let reader = RawGenBookReader::new(module, &dir).unwrap();
        assert_eq!(reader.keys(), &["Alpha".to_string(), "Zebra".to_string()]);
    }

    #[test]
    fn search_is_substring_case_insensitive() {
        let (module, dir) = write_fixture(
            "search",
            &[("Chapter 1", "x"), ("Chapter 2", "y"), ("Preface", "z")],
        );
        let reader = RawGenBookReader::new(module, &dir).unwrap();
        assert_eq!(reader.search_keys("chap").len(), 2);
        assert!(reader.search_keys("missing").is_empty());
    }

    #[test]
    fn unknown_key_is_an_error() {
        let (module, dir) = write_fixture("unknown", &[("Only", "entry")]);
        let reader = RawGenBookReader::new(module, &dir).unwrap();
        assert!(reader.entry("Nothing").is_err());
    }
}

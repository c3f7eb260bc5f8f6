//! Reader for SWORD zText/zText4 modules (compressed Bible text).
//!
//! A zText module stores three files per testament:
//!   - `{ot,nt}.bzs` block index: 12-byte records (offset, compSize,
//!     uncompSize), little-endian
//!   - `{ot,nt}.bzv` verse index: one record per verse slot (blockNum,
//!     start, len); 10 bytes for zText (u16 len), 12 for zText4 (u32 len)
//!   - `{ot,nt}.bzz` zlib-compressed text blocks
//!
//! The record width follows the module's declared driver, never file
//! content. Slot arithmetic lives in the versification system; this
//! reader only indexes by slot.

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::Arc;

use flate2::read::ZlibDecoder;
use parking_lot::RwLock;

use crate::error::{ConvertError, Result};
use crate::types::{Module, ModuleDriver, VerseRef};
use crate::versification::{self, Testament, VersificationSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockIndexRecord {
    pub offset: u32,
    pub comp_size: u32,
    pub uncomp_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerseIndexRecord {
    pub block_num: u32,
    pub start: u32,
    pub len: u32,
}

/// Which on-disk testament file a verse lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestamentFile {
    Ot,
    Nt,
}

impl TestamentFile {
    pub fn prefix(&self) -> &'static str {
        match self {
            TestamentFile::Ot => "ot",
            TestamentFile::Nt => "nt",
        }
    }

    pub fn for_testament(testament: Testament) -> TestamentFile {
        if testament.in_nt_file() {
            TestamentFile::Nt
        } else {
            TestamentFile::Ot
        }
    }
}

/// Cache of decompressed blocks, scoped to one extraction run and shared
/// read-only between workers.
#[derive(Default)]
pub struct BlockCache {
    blocks: RwLock<HashMap<(TestamentFile, u32), Arc<Vec<u8>>>>,
}

impl BlockCache {
    pub fn new() -> Self {
        BlockCache::default()
    }

    fn get(&self, key: (TestamentFile, u32)) -> Option<Arc<Vec<u8>>> {
        self.blocks.read().get(&key).cloned()
    }

    fn insert(&self, key: (TestamentFile, u32), block: Arc<Vec<u8>>) {
        self.blocks.write().insert(key, block);
    }

    pub fn clear(&self) {
        self.blocks.write().clear();
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

struct TestamentIndices {
    blocks: Vec<BlockIndexRecord>,
    verses: Vec<VerseIndexRecord>,
    bzz_path: PathBuf,
}

pub struct ZTextReader {
    module: Module,
    system: Arc<VersificationSystem>,
    ot: Option<TestamentIndices>,
    nt: Option<TestamentIndices>,
    cache: BlockCache,
}

impl ZTextReader {
    /// Opens a zText/zText4 module, loading both testament indices.
    /// A testament may be absent (OT-only or NT-only modules); a module
    /// with neither is `DataNotFound`.
    pub fn new(module: Module, sword_dir: &std::path::Path) -> Result<Self> {
        let driver = module
            .driver
            .ok_or_else(|| ConvertError::UnsupportedDriver("none".to_string()))?;
        let record_width = match driver {
            ModuleDriver::ZText | ModuleDriver::ZText4 => driver.verse_record_width(),
            ModuleDriver::RawGenBook => {
                return Err(ConvertError::UnsupportedDriver("RawGenBook".to_string()));
            }
        };

        let system = versification::system_for_module(&module)?;
        let data_path = module.resolve_data_path(sword_dir);

        let ot = load_testament_indices(&data_path, TestamentFile::Ot, record_width)?;
        let nt = load_testament_indices(&data_path, TestamentFile::Nt, record_width)?;

        if ot.is_none() && nt.is_none() {
            return Err(ConvertError::DataNotFound(data_path));
        }

        Ok(ZTextReader {
            module,
            system,
            ot,
            nt,
            cache: BlockCache::new(),
        })
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn versification(&self) -> &Arc<VersificationSystem> {
        &self.system
    }

    pub fn has_testament(&self, file: TestamentFile) -> bool {
        match file {
            TestamentFile::Ot => self.ot.is_some(),
            TestamentFile::Nt => self.nt.is_some(),
        }
    }

    fn indices(&self, file: TestamentFile) -> Result<&TestamentIndices> {
        let indices = match file {
            TestamentFile::Ot => self.ot.as_ref(),
            TestamentFile::Nt => self.nt.as_ref(),
        };
        indices.ok_or_else(|| {
            ConvertError::DataNotFound(PathBuf::from(format!("{}.bzv", file.prefix())))
        })
    }

    /// Reads the verse index record at a slot. The slot is trusted as-is;
    /// slot arithmetic belongs to the versification system.
    pub fn read_verse_record(&self, file: TestamentFile, slot: usize) -> Result<VerseIndexRecord> {
        let indices = self.indices(file)?;
        indices
            .verses
            .get(slot)
            .copied()
            .ok_or(ConvertError::OutOfRange {
                slot,
                max: indices.verses.len(),
            })
    }

    /// Returns the decompressed block, from cache when already inflated.
    pub fn get_block(&self, file: TestamentFile, block_num: u32) -> Result<Arc<Vec<u8>>> {
        if let Some(cached) = self.cache.get((file, block_num)) {
            return Ok(cached);
        }

        let indices = self.indices(file)?;
        let entry = indices
            .blocks
            .get(block_num as usize)
            .copied()
            .ok_or_else(|| ConvertError::CorruptBlock {
                block: block_num,
                reason: format!("block index has {} records", indices.blocks.len()),
            })?;

        if entry.comp_size == 0 {
            return Err(ConvertError::CorruptBlock {
                block: block_num,
                reason: "empty block".to_string(),
            });
        }

        let mut file_handle = fs::File::open(&indices.bzz_path)?;
        file_handle.seek(SeekFrom::Start(entry.offset as u64))?;
        let mut compressed = vec![0u8; entry.comp_size as usize];
        file_handle
            .read_exact(&mut compressed)
            .map_err(|e| ConvertError::CorruptBlock {
                block: block_num,
                reason: format!("short read: {}", e),
            })?;

        let block = Arc::new(inflate_block(&compressed, entry.uncomp_size as usize, block_num)?);
        self.cache.insert((file, block_num), block.clone());
        Ok(block)
    }

    /// Raw verse text at a reference. A zero-length record is an empty
    /// verse, not an error.
    pub fn verse_text(&self, book: &str, chapter: i32, verse: i32) -> Result<String> {
        let book = versification::normalize_book_id(book);
        let book_def = self
            .system
            .get_book(&book)
            .ok_or_else(|| ConvertError::UnknownBook(book.clone()))?;
        let file = TestamentFile::for_testament(book_def.testament);

        let slot = self.system.verse_slot(&book, chapter, verse)?;
        let record = self.read_verse_record(file, slot)?;

        if record.len == 0 {
            return Ok(String::new());
        }

        let block = self.get_block(file, record.block_num)?;
        let start = record.start as usize;
        let end = start + record.len as usize;
        if end > block.len() {
            return Err(ConvertError::CorruptBlock {
                block: record.block_num,
                reason: format!(
                    "verse extends beyond block: start={} len={} block_len={}",
                    record.start,
                    record.len,
                    block.len()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&block[start..end]).into_owned())
    }

    pub fn verse_text_at(&self, verse_ref: &VerseRef) -> Result<String> {
        self.verse_text(&verse_ref.book, verse_ref.chapter, verse_ref.verse)
    }

    /// Checks that the module's index layout agrees with its declared
    /// versification by reading well-known anchor references and requiring
    /// non-empty text. Anchors whose book is absent from the system, or
    /// whose testament file is absent from the module, are skipped. More
    /// than `tolerance` failures is a `VersificationMismatch`.
    pub fn validate_anchors(&self, tolerance: usize) -> Result<()> {
        const ANCHORS: [(&str, i32, i32); 4] = [
            ("Gen", 1, 1),
            ("Ps", 23, 1),
            ("John", 3, 16),
            ("Rev", 22, 21),
        ];

        let mut checked = 0;
        let mut failed = 0;

        for (book, chapter, verse) in ANCHORS {
            let Some(book_def) = self.system.get_book(book) else {
                continue;
            };
            if verse > book_def.verses(chapter) {
                continue;
            }
            let file = TestamentFile::for_testament(book_def.testament);
            if !self.has_testament(file) {
                continue;
            }

            checked += 1;
            match self.verse_text(book, chapter, verse) {
                Ok(text) if !text.trim().is_empty() => {}
                _ => failed += 1,
            }
        }

        if failed > tolerance {
            return Err(ConvertError::VersificationMismatch {
                module: self.module.id.clone(),
                failed,
                checked,
            });
        }
        Ok(())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

fn load_testament_indices(
    data_path: &std::path::Path,
    file: TestamentFile,
    record_width: usize,
) -> Result<Option<TestamentIndices>> {
    let bzs_path = data_path.join(format!("{}.bzs", file.prefix()));
    let bzv_path = data_path.join(format!("{}.bzv", file.prefix()));
    let bzz_path = data_path.join(format!("{}.bzz", file.prefix()));

    let bzs_data = match fs::read(&bzs_path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let bzv_data = fs::read(&bzv_path)?;

    let mut blocks = Vec::with_capacity(bzs_data.len() / 12);
    for chunk in bzs_data.chunks_exact(12) {
        blocks.push(BlockIndexRecord {
            offset: u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
            comp_size: u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]),
            uncomp_size: u32::from_le_bytes([chunk[8], chunk[9], chunk[10], chunk[11]]),
        });
    }

    let mut verses = Vec::with_capacity(bzv_data.len() / record_width);
    for chunk in bzv_data.chunks_exact(record_width) {
        let len = if record_width == 10 {
            u16::from_le_bytes([chunk[8], chunk[9]]) as u32
        } else {
            u32::from_le_bytes([chunk[8], chunk[9], chunk[10], chunk[11]])
        };
        verses.push(VerseIndexRecord {
            block_num: u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]),
            start: u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]),
            len,
        });
    }

    Ok(Some(TestamentIndices {
        blocks,
        verses,
        bzz_path,
    }))
}

/// Inflates a zlib block, capping output at the declared uncompressed
/// size and requiring an exact match.
fn inflate_block(compressed: &[u8], expected: usize, block_num: u32) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    let mut decoder = ZlibDecoder::new(compressed).take(expected as u64 + 1);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ConvertError::CorruptBlock {
            block: block_num,
            reason: format!("inflate failed: {}", e),
        })?;

    if out.len() != expected {
        return Err(ConvertError::CorruptBlock {
            block: block_num,
            reason: format!("size mismatch: expected {} got {}", expected, out.len()),
        });
    }
    Ok(out)
}

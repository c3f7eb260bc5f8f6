pub mod types;
pub mod error;
pub mod logger;
pub mod conf;
pub mod ztext;
pub mod rawgenbook;
pub mod esword;
pub mod esword_schema;
pub mod versification;
pub mod versification_kjv;
pub mod versification_kjva;
pub mod versification_vulg;
pub mod verse_mapper;
pub mod markup;
pub mod extractor;
pub mod json_output;
pub mod compare;
pub mod golden;
pub mod tiers;

use std::path::PathBuf;

pub use error::{ConvertError, Result};

/// Root of the SWORD library tree, containing `mods.d/` and `modules/`.
///
/// Taken from the `SWORD_PATH` environment variable when set, otherwise
/// `~/.sword`.
pub fn get_sword_dir() -> PathBuf {
    if let Ok(p) = std::env::var("SWORD_PATH") {
        if !p.is_empty() {
            return PathBuf::from(p);
        }
    }
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".sword"),
        Err(_) => PathBuf::from(".sword"),
    }
}

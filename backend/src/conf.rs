use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ConvertError, Result};
use crate::logger;
use crate::types::Module;

/// Parses a SWORD `.conf` file into module metadata.
///
/// Unknown keys are ignored. A missing `[Section]` header or `ModDrv` key
/// is an `InvalidConf` error, everything else is tolerated with defaults.
pub fn parse_conf(conf_path: &Path) -> Result<Module> {
    let contents = fs::read_to_string(conf_path)
        .map_err(|_| ConvertError::DataNotFound(conf_path.to_path_buf()))?;

    let mut module = Module {
        conf_path: conf_path.to_path_buf(),
        ..Default::default()
    };

    for raw_line in contents.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            module.id = line[1..line.len() - 1].to_lowercase();
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "Description" => module.title = value.to_string(),
            "About" => module.about = parse_about_text(value),
            "ModDrv" => module.driver = value.parse().ok(),
            "SourceType" => module.source_type = value.parse().unwrap_or_default(),
            "Lang" => module.language = value.to_string(),
            "Versification" => module.versification = value.to_string(),
            "DataPath" => module.data_path = value.to_string(),
            "CompressType" => module.compress_type = value.to_string(),
            "BlockType" => module.block_type = value.to_string(),
            "Encoding" => module.encoding = value.to_string(),
            "Version" => module.version = value.to_string(),
            "Copyright" => module.copyright = value.to_string(),
            "DistributionLicense" => module.distribution_license = value.to_string(),
            "Category" => module.category = value.to_string(),
            "Feature" => module.features.push(value.to_string()),
            "GlobalOptionFilter" => module.global_option_filters.push(value.to_string()),
            _ => {}
        }
    }

    if module.id.is_empty() {
        return Err(ConvertError::InvalidConf {
            path: conf_path.to_path_buf(),
            reason: "missing [Section] header".to_string(),
        });
    }

    if module.driver.is_none() {
        return Err(ConvertError::InvalidConf {
            path: conf_path.to_path_buf(),
            reason: "missing or unsupported ModDrv".to_string(),
        });
    }

    // KJV is the implied default for modules that predate the key.
    if module.versification.is_empty() {
        module.versification = "KJV".to_string();
    }

    if module.description.is_empty() && !module.about.is_empty() {
        module.description = truncate_description(&module.about, 200);
    }

    Ok(module)
}

/// Converts the RTF-like encoding of the `About` field to plain text.
fn parse_about_text(text: &str) -> String {
    // `\pard` and `\qc` must go first or the `\par` pass eats their prefix.
    let text = text
        .replace("\\pard", "")
        .replace("\\qc", "")
        .replace("\\par\\par", "\n\n")
        .replace("\\par ", "\n")
        .replace("\\par", "\n");
    text.trim().to_string()
}

/// Truncates text to max_len, ending at a word boundary.
fn truncate_description(text: &str, max_len: usize) -> String {
    let mut text = text;
    if let Some(idx) = text.find('\n') {
        if idx > 0 && idx < max_len {
            text = &text[..idx];
        }
    }

    if text.chars().count() <= max_len {
        return text.to_string();
    }

    let boundary = text
        .char_indices()
        .nth(max_len)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let truncated = &text[..boundary];
    match truncated.rfind(' ') {
        Some(idx) if idx > 0 => format!("{}...", &truncated[..idx]),
        _ => format!("{}...", truncated),
    }
}

/// Finds all `.conf` files under `<sword_dir>/mods.d`.
pub fn discover_modules(sword_dir: &Path) -> Result<Vec<PathBuf>> {
    let mods_dir = sword_dir.join("mods.d");
    if !mods_dir.is_dir() {
        return Err(ConvertError::DataNotFound(mods_dir));
    }

    let mut conf_files: Vec<PathBuf> = WalkDir::new(&mods_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("conf"))
        .collect();

    conf_files.sort();
    Ok(conf_files)
}

/// Loads metadata for every module in a SWORD directory. Modules with
/// unparseable conf files are skipped with a warning.
pub fn load_all_modules(sword_dir: &Path) -> Result<Vec<Module>> {
    let conf_files = discover_modules(sword_dir)?;

    let mut modules = Vec::new();
    for conf_path in conf_files {
        match parse_conf(&conf_path) {
            Ok(module) => modules.push(module),
            Err(e) => {
                logger::warn(&format!("Failed to parse {}: {}", conf_path.display(), e));
            }
        }
    }

    Ok(modules)
}

use std::path::{Path, PathBuf};
use std::process::exit;
use std::sync::atomic::AtomicBool;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;

use cedrus_backend::conf::{load_all_modules, parse_conf};
use cedrus_backend::esword::ESwordBible;
use cedrus_backend::extractor::{extract_module, ExtractorOptions};
use cedrus_backend::get_sword_dir;
use cedrus_backend::json_output::{JsonWriter, OutputMeta};
use cedrus_backend::logger;
use cedrus_backend::rawgenbook::RawGenBookReader;
use cedrus_backend::types::{parse_reference, CanonicalDocument, ModuleDriver, ModuleType};
use cedrus_backend::verse_mapper::VerseMapper;
use cedrus_backend::ztext::ZTextReader;

#[derive(Parser, Debug)]
#[command(author, version, about = "Cedrus: SWORD and e-Sword Bible module converter", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the SWORD directory (containing mods.d/ and modules/).
    /// If not provided, the SWORD_PATH environment variable is used,
    /// then ~/.sword.
    #[arg(long, global = true, value_name = "DIRECTORY_PATH", env = "SWORD_PATH")]
    sword_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert modules to the two-file JSON output
    Convert {
        /// Module ids to convert; all discovered Bible modules when empty
        modules: Vec<String>,

        /// e-Sword .bblx files to convert in the same run
        #[arg(long, value_name = "FILE_PATH")]
        bblx: Vec<PathBuf>,

        /// Output directory for bibles.json and bibles_auxiliary/
        #[arg(long, short, value_name = "DIRECTORY_PATH", default_value = "out")]
        out_dir: PathBuf,

        /// Worker threads per module
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },

    /// Look up a single verse in a module
    #[command(arg_required_else_help = true)]
    Verse {
        /// Module id
        module: String,

        /// Reference, e.g. "John 3:16" or "Gen.1.1"
        reference: String,

        /// Map the reference into another versification system first
        #[arg(long, value_name = "SYSTEM")]
        from_system: Option<String>,
    },

    /// Print module metadata; lists all modules when no id is given
    Inspect {
        /// Module id
        module: Option<String>,
    },

    /// Check a module's data files against the anchor references
    #[command(arg_required_else_help = true)]
    Validate {
        /// Module id
        module: String,

        /// Anchor references allowed to fail
        #[arg(long, default_value_t = 0)]
        tolerance: usize,
    },
}

fn find_module(sword_dir: &Path, id: &str) -> Result<cedrus_backend::types::Module, String> {
    let conf_path = sword_dir.join("mods.d").join(format!("{}.conf", id.to_lowercase()));
    if conf_path.is_file() {
        return parse_conf(&conf_path).map_err(|e| e.to_string());
    }
    load_all_modules(sword_dir)
        .map_err(|e| e.to_string())?
        .into_iter()
        .find(|m| m.id.eq_ignore_ascii_case(id))
        .ok_or_else(|| format!("module not found: {}", id))
}

fn convert_modules(
    sword_dir: &Path,
    module_ids: &[String],
    bblx_paths: &[PathBuf],
    out_dir: &Path,
    workers: usize,
) -> Result<(), String> {
    let modules = if module_ids.is_empty() {
        load_all_modules(sword_dir)
            .map_err(|e| e.to_string())?
            .into_iter()
            .filter(|m| {
                m.driver
                    .map(|d| d.module_type() == ModuleType::Bible)
                    .unwrap_or(false)
            })
            .collect()
    } else {
        let mut modules = Vec::new();
        for id in module_ids {
            modules.push(find_module(sword_dir, id)?);
        }
        modules
    };

    let cancel = AtomicBool::new(false);
    let options = ExtractorOptions {
        workers,
        ..Default::default()
    };

    let mut documents: Vec<CanonicalDocument> = Vec::new();
    let mut failed: Vec<String> = Vec::new();

    for module in &modules {
        logger::info(&format!("converting {}", module.id));
        match extract_module(module, sword_dir, &cancel, &options) {
            Ok(extraction) => documents.push(extraction.document),
            Err(e) => {
                logger::error(&format!("{}: {}", module.id, e));
                failed.push(module.id.clone());
            }
        }
    }

    for path in bblx_paths {
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        logger::info(&format!("converting {} (e-Sword)", path.display()));
        let result = ESwordBible::open(path).and_then(|bible| bible.to_document(&id));
        match result {
            Ok(document) => documents.push(document),
            Err(e) => {
                logger::error(&format!("{}: {}", path.display(), e));
                failed.push(id);
            }
        }
    }

    let meta = OutputMeta::new(chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string());
    let written = JsonWriter::new(out_dir)
        .write(&documents, &meta)
        .map_err(|e| e.to_string())?;
    println!(
        "wrote {} files for {} modules to {}",
        written.len(),
        documents.len(),
        out_dir.display()
    );

    if failed.is_empty() {
        Ok(())
    } else {
        Err(format!("{} module(s) failed: {}", failed.len(), failed.join(", ")))
    }
}

fn show_verse(
    sword_dir: &Path,
    module_id: &str,
    reference: &str,
    from_system: Option<&str>,
) -> Result<(), String> {
    let module = find_module(sword_dir, module_id)?;
    let reader = ZTextReader::new(module, sword_dir).map_err(|e| e.to_string())?;
    let target_system = reader.versification().name.clone();

    let source_system = from_system.unwrap_or(&target_system);
    let verse_ref = parse_reference(reference, source_system)
        .ok_or_else(|| format!("cannot parse reference: {}", reference))?;

    let verse_ref = if source_system == target_system {
        verse_ref
    } else {
        let mapper = VerseMapper::new();
        let (mapped, _) = mapper
            .map(&verse_ref, &target_system)
            .map_err(|e| e.to_string())?;
        println!("{} -> {}", reference, mapped);
        mapped
    };

    let text = reader.verse_text_at(&verse_ref).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
}

fn inspect(sword_dir: &Path, module_id: Option<&str>) -> Result<(), String> {
    let Some(module_id) = module_id else {
        let modules = load_all_modules(sword_dir).map_err(|e| e.to_string())?;
        for m in &modules {
            let driver = m.driver.map(|d| d.to_string()).unwrap_or_default();
            println!("{}: {} [{}]", m.id, m.title, driver);
        }
        println!("{}", modules.len());
        return Ok(());
    };

    let module = find_module(sword_dir, module_id)?;
    println!("id: {}", module.id);
    println!("title: {}", module.title);
    println!("driver: {}", module.driver.map(|d| d.to_string()).unwrap_or_default());
    println!("source type: {:?}", module.source_type);
    println!("language: {}", module.language);
    println!("versification: {}", module.versification);
    println!("data path: {}", module.data_path);
    if !module.features.is_empty() {
        println!("features: {}", module.features.join(", "));
    }

    if module.driver == Some(ModuleDriver::RawGenBook) {
        let reader = RawGenBookReader::new(module, sword_dir).map_err(|e| e.to_string())?;
        println!("entries: {}", reader.entry_count());
        for key in reader.keys().iter().take(10) {
            println!("  {}", key);
        }
    }
    Ok(())
}

fn validate(sword_dir: &Path, module_id: &str, tolerance: usize) -> Result<(), String> {
    let module = find_module(sword_dir, module_id)?;
    let reader = ZTextReader::new(module, sword_dir).map_err(|e| e.to_string())?;
    reader.validate_anchors(tolerance).map_err(|e| e.to_string())?;
    println!("{}: anchor references OK", module_id);
    Ok(())
}

fn main() {
    if dotenv().is_err() {
        println!("Info: No .env file found or failed to load.");
    }
    logger::init_tracing();

    let cli = Cli::parse();

    // Precedence:
    // - given with --sword-dir
    // - set with env var SWORD_PATH (clap picks it up)
    // - ~/.sword
    let sword_dir = cli.sword_dir.unwrap_or_else(get_sword_dir);

    if !sword_dir.is_dir() {
        eprintln!(
            "Error: Directory does not exist or is not a directory: {:?}",
            sword_dir
        );
        eprintln!("Use the --sword-dir option or set the SWORD_PATH environment variable.");
        exit(1);
    }

    let command_result = match cli.command {
        Commands::Convert {
            modules,
            bblx,
            out_dir,
            workers,
        } => convert_modules(&sword_dir, &modules, &bblx, &out_dir, workers),

        Commands::Verse {
            module,
            reference,
            from_system,
        } => show_verse(&sword_dir, &module, &reference, from_system.as_deref()),

        Commands::Inspect { module } => inspect(&sword_dir, module.as_deref()),

        Commands::Validate { module, tolerance } => validate(&sword_dir, &module, tolerance),
    };

    if let Err(e) = command_result {
        eprintln!("Error executing command: {}", e);
        exit(1);
    }
}

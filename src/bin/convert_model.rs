//! Model converter: loads a text or binary document and saves it again.
//!
//! Usage: cargo run --bin convert_model -- <INPUT> <OUTPUT> [OPTIONS]
//!
//! The input format is detected from its content. The output is binary
//! when OUTPUT ends in `.lcd`, text otherwise.
//!
//! Options:
//!   --config <PATH>   JSON engine config (default: built-in defaults)

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use studcad::core::logging;
use studcad::core::ModelConfig;
use studcad::model::Model;
use studcad::part::PartCatalog;

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn positional(args: &[String]) -> Vec<&String> {
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args.iter().skip(1) {
        if skip {
            skip = false;
        } else if arg.starts_with("--") {
            skip = true;
        } else {
            out.push(arg);
        }
    }
    out
}

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let paths = positional(&args);
    let (input, output) = match paths.as_slice() {
        [input, output] => (PathBuf::from(input), PathBuf::from(output)),
        _ => {
            eprintln!("Usage: convert_model <INPUT> <OUTPUT> [--config <PATH>]");
            return ExitCode::FAILURE;
        }
    };

    let config = match parse_str_arg(&args, "--config") {
        Some(path) => match ModelConfig::load_sync(&PathBuf::from(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => ModelConfig::default(),
    };

    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string());
    let catalog = Arc::new(PartCatalog::new());
    let mut model = Model::new(name, catalog.clone(), config);

    let start = Instant::now();
    if let Err(e) = model.load_file(&input) {
        log::error!("Failed to load {}: {}", input.display(), e);
        return ExitCode::FAILURE;
    }
    if let Err(e) = model.save_file(&output) {
        log::error!("Failed to save {}: {}", output.display(), e);
        return ExitCode::FAILURE;
    }

    log::info!(
        "Converted {} -> {} in {:.1}ms ({} pieces, {} parts in catalog)",
        input.display(),
        output.display(),
        start.elapsed().as_secs_f64() * 1000.0,
        model.pieces().len(),
        catalog.len()
    );
    ExitCode::SUCCESS
}

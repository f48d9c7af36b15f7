//! # compressit - Main Entry Point
//!
//! Punto di ingresso della CLI: comprime un singolo file con il tool esterno adatto.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento della configurazione JSON e override da CLI
//! - Output umano (con spinner) o JSON (`--json`)
//!
//! ## Esempio di utilizzo:
//! ```bash
//! compressit upload.png --png-quality 40-70 --temp-dir /var/tmp/compressit --json
//! compressit --check-tools
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use compressit::file_manager::format_size;
use compressit::json_output::{JsonMessage, ToolAvailability};
use compressit::platform::SystemInfo;
use compressit::progress::ProgressManager;
use compressit::tool_resolver::{ToolPathResolver, KNOWN_TOOLS};
use compressit::{Compressor, Config};

#[derive(Parser)]
#[command(name = "compressit")]
#[command(about = "Shrink one file with the external optimizer matching its type")]
struct Args {
    /// File to compress (left untouched; the result is written to the temp dir)
    #[arg(required_unless_present = "check_tools")]
    file: Option<PathBuf>,

    /// MIME type of the file (detected when omitted)
    #[arg(short, long)]
    mime: Option<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scratch directory for compressed output
    #[arg(short, long)]
    temp_dir: Option<PathBuf>,

    /// Per-tool timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// pngquant quality window, e.g. 45-65
    #[arg(long, value_parser = parse_quality_range)]
    png_quality: Option<(u8, u8)>,

    /// jpegoptim max quality (0 = lossless)
    #[arg(long)]
    jpeg_quality: Option<u8>,

    /// Report which optimizer tools are installed and exit
    #[arg(long)]
    check_tools: bool,

    /// Emit line-delimited JSON instead of human-readable output
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_quality_range(raw: &str) -> std::result::Result<(u8, u8), String> {
    let (min, max) = raw
        .split_once('-')
        .ok_or_else(|| format!("expected MIN-MAX, got {:?}", raw))?;
    let min = min.trim().parse::<u8>().map_err(|e| format!("invalid min: {e}"))?;
    let max = max.trim().parse::<u8>().map_err(|e| format!("invalid max: {e}"))?;
    Ok((min, max))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args).await?;
    debug!("Effective configuration: {:?}", config);

    if args.check_tools {
        report_tools(&config.resolver(), args.json);
        return Ok(());
    }

    let Some(file) = args.file.clone() else {
        return Err(anyhow::anyhow!("No input file given"));
    };
    if !file.is_file() {
        return fail(&args, format!("Input file does not exist: {}", file.display()));
    }

    let compressor = Compressor::new(config)?;
    let progress = if args.json {
        ProgressManager::hidden()
    } else {
        ProgressManager::spinner(format!("Compressing {}", file.display()))
    };

    match compressor.compress(&file, args.mime.as_deref()).await {
        Ok(Some(result)) => {
            progress.clear();
            if args.json {
                JsonMessage::compressed(result).emit();
            } else {
                info!(
                    "✅ {}: {} -> {} ({} saved)",
                    file.display(),
                    format_size(result.original_size),
                    format_size(result.compressed_size),
                    result.savings_label()
                );
                println!("{}", result.path.display());
            }
            Ok(())
        }
        Ok(None) => {
            progress.clear();
            if args.json {
                JsonMessage::skipped(file).emit();
            } else {
                info!("⏭️  {}: no compression applied", file.display());
            }
            Ok(())
        }
        Err(e) => {
            progress.clear();
            fail(&args, e.to_string())
        }
    }
}

async fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    if let Some(ref dir) = args.temp_dir {
        config.temp_dir = Some(dir.clone());
    }
    if let Some(secs) = args.timeout {
        config.timeout_secs = Some(secs);
    }
    if let Some((min, max)) = args.png_quality {
        config.png_quality_min = min;
        config.png_quality_max = max;
    }
    if let Some(quality) = args.jpeg_quality {
        config.jpeg_quality = quality;
    }

    config.validate()?;
    Ok(config)
}

fn report_tools(resolver: &ToolPathResolver, json: bool) {
    let tools: Vec<ToolAvailability> = KNOWN_TOOLS
        .iter()
        .map(|name| {
            let available = matches!(resolver.is_tool_available(name), Ok(true));
            ToolAvailability {
                name: name.to_string(),
                available,
                install_hint: (!available).then(|| ToolPathResolver::get_linux_install_instructions(name)),
            }
        })
        .collect();

    if json {
        JsonMessage::Tools { tools }.emit();
        return;
    }

    info!("🔧 Checking available optimization tools on {}:", SystemInfo::current());
    for tool in &tools {
        match tool.install_hint {
            None => info!("  ✅ {}", tool.name),
            Some(ref hint) => info!("  ❌ {} (install with: {})", tool.name, hint),
        }
    }
}

fn fail(args: &Args, message: String) -> Result<()> {
    if args.json {
        JsonMessage::error(message.clone(), None).emit();
    }
    Err(anyhow::anyhow!(message))
}

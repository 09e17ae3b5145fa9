//! MintForge CLI - collection pipeline tools
//!
//! Commands: validate, rewrite-cid, convert, resize
//! Reports go to stdout, logs to stderr.
//! `validate` exits 0/1/2/3 per the supply outcome; other commands exit 1 on error.

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use mintforge_core::{
    convert_to_webp, normalize_cid_base, render_text, resize_half, rewrite_metadata,
    validate_supply, ImageBatch, PipelineConfig, ReportEnvelope, ENGINE_VERSION,
};

#[derive(Parser)]
#[command(name = "mintforge-cli", version = ENGINE_VERSION)]
#[command(about = "MintForge CLI - collection media pipeline and supply validator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional JSON config file (directory layout, report limits)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that images and metadata form a complete, unique collection
    Validate {
        /// Directory holding <id>.png images
        #[arg(long)]
        images: Option<PathBuf>,

        /// Directory holding <id>.json metadata
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Point metadata image fields at an IPFS CID
    RewriteCid {
        /// CID or ipfs://CID/ base; prompted for when omitted
        #[arg(long)]
        cid: Option<String>,

        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Output directory for rewritten metadata
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Convert PNGs to lossless WebP
    Convert {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Write half-size copies of PNGs
    Resize {
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over --debug.
    let default_level = if cli.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    let config = match PipelineConfig::load_or_default(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Validate { images, metadata, json } => {
            let images = images.unwrap_or(config.images_dir);
            let metadata = metadata.unwrap_or(config.metadata_dir);

            let report = match validate_supply(&images, &metadata) {
                Ok(r) => r,
                Err(e) => {
                    error!("{e}");
                    return ExitCode::FAILURE;
                }
            };

            if json {
                let rendered = ReportEnvelope::new(&report)
                    .and_then(|envelope| serde_json::to_string_pretty(&envelope));
                match rendered {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        error!("Failed to serialize report: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print!("{}", render_text(&report, &config.report));
            }

            ExitCode::from(report.exit_code())
        }

        Commands::RewriteCid { cid, metadata, out } => {
            let metadata = metadata.unwrap_or(config.metadata_dir);
            let out = out.unwrap_or(config.rewrite_out_dir);

            let raw = match cid {
                Some(c) => c,
                None => match prompt("Paste IPFS CID base (CID or ipfs://CID/): ") {
                    Ok(line) => line,
                    Err(e) => {
                        error!("Failed to read CID: {e}");
                        return ExitCode::FAILURE;
                    }
                },
            };

            let base = match normalize_cid_base(&raw) {
                Ok(b) => b,
                Err(e) => {
                    error!("{e}");
                    return ExitCode::FAILURE;
                }
            };
            println!("Using base: {base}");
            println!("Writing updated metadata to: {}", out.display());

            match rewrite_metadata(&metadata, &out, &base) {
                Ok(summary) => {
                    println!(
                        "Done. Updated {} metadata files into {}.",
                        summary.updated,
                        summary.out_dir.display()
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!("{e}");
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Convert { input, out } => {
            let input = input.unwrap_or(config.images_dir);
            let out = out.unwrap_or(config.webp_out_dir);
            finish_batch(convert_to_webp(&input, &out), "Lossless WebP files", &out)
        }

        Commands::Resize { input, out } => {
            let input = input.unwrap_or(config.images_dir);
            let out = out.unwrap_or(config.resized_out_dir);
            finish_batch(resize_half(&input, &out), "Resized PNGs", &out)
        }
    }
}

fn prompt(message: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    stdout.write_all(message.as_bytes())?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn finish_batch(
    result: Result<ImageBatch, mintforge_core::imaging::ImagingError>,
    label: &str,
    out: &std::path::Path,
) -> ExitCode {
    let batch = match result {
        Ok(b) => b,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    for done in &batch.processed {
        println!(
            "{} -> {} ({}x{})",
            done.source.display(),
            done.output.display(),
            done.size[0],
            done.size[1]
        );
    }
    for failed in &batch.failed {
        println!("FAILED {}: {}", failed.source.display(), failed.reason);
    }

    println!(
        "Done. {label} in {} ({} written, {} failed)",
        out.display(),
        batch.processed.len(),
        batch.failed.len()
    );

    if batch.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

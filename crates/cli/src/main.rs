//! CLI tool for restyling PowerPoint decks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deckstyle_core::{PresentationInfo, PresetTable, StyleOptions, StylePreset};
use deckstyle_pptx::{output_filename, restyle_bytes, PptxDocument};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Recolor PowerPoint decks with a fixed style preset.
#[derive(Parser, Debug)]
#[command(name = "deckstyle")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a preset and write "<preset>_<filename>" for each input
    Apply {
        /// Input PowerPoint file(s) (.pptx)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Preset name, e.g. "Modern Tech" or "Business Professional"
        #[arg(short, long)]
        style: String,

        /// Output directory (default: same as input file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also scale explicit font sizes when the preset supports it
        #[arg(long)]
        scale_fonts: bool,
    },

    /// Show slide count, file size and page size
    Info {
        /// Input PowerPoint file(s) (.pptx)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the available presets and their palettes
    Presets {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match &args.command {
        Command::Apply {
            input,
            style,
            output,
            scale_fonts,
        } => {
            // Fail once up front rather than once per file.
            PresetTable::builtin().get(style).with_context(|| {
                format!(
                    "Unknown style preset {:?}. Available presets: {}",
                    style,
                    PresetTable::builtin().names().join(", ")
                )
            })?;

            let options = StyleOptions {
                scale_fonts: *scale_fonts,
            };
            let mut failed = 0;

            for input_path in input {
                match apply_file(input_path, style, output.as_ref(), options, args.verbose) {
                    Ok(output_path) => println!("{}", output_path.display()),
                    Err(e) => {
                        eprintln!("Error processing {}: {:#}", input_path.display(), e);
                        failed += 1;
                    }
                }
            }

            if failed > 0 {
                anyhow::bail!("{} of {} file(s) failed", failed, input.len());
            }
        }
        Command::Info { input, json } => print_info(input, *json)?,
        Command::Presets { json } => {
            let table = PresetTable::builtin();
            if *json {
                let presets: Vec<&StylePreset> = table.iter().collect();
                println!("{}", serde_json::to_string_pretty(&presets)?);
            } else {
                for preset in table.iter() {
                    print!("{}", format_preset(preset));
                }
            }
        }
    }

    Ok(())
}

/// Restyle one file, returning where the result was written.
fn apply_file(
    input_path: &Path,
    style: &str,
    output_dir: Option<&PathBuf>,
    options: StyleOptions,
    verbose: bool,
) -> Result<PathBuf> {
    let data = std::fs::read(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;

    log::debug!("Restyling {} with {:?}", input_path.display(), style);
    let restyled = restyle_bytes(&data, style, options)?;

    if verbose {
        eprintln!(
            "  {} slides, {} runs restyled, {} element(s) skipped",
            restyled.report.slides,
            restyled.report.runs_styled,
            restyled.report.skipped.len()
        );
        for skipped in &restyled.report.skipped {
            eprintln!("    slide {}: {}", skipped.slide, skipped.reason);
        }
    }

    let output_path = get_output_path(input_path, style, output_dir)?;
    std::fs::write(&output_path, &restyled.bytes)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    Ok(output_path)
}

/// Print info for each input, failing at the end if any could not be read.
fn print_info(input: &[PathBuf], json: bool) -> Result<()> {
    let mut failed = 0;

    for input_path in input {
        match read_info(input_path) {
            Ok(info) if json => println!("{}", serde_json::to_string(&info)?),
            Ok(info) => print!("{}", format_info(input_path, &info)),
            Err(e) => {
                eprintln!("Error reading {}: {:#}", input_path.display(), e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) could not be read", failed, input.len());
    }
    Ok(())
}

fn read_info(input_path: &Path) -> Result<FileInfo> {
    let document = PptxDocument::open(input_path)
        .with_context(|| format!("Failed to parse {}", input_path.display()))?;
    Ok(FileInfo {
        file: input_path.display().to_string(),
        info: document.info(),
    })
}

#[derive(Debug, Serialize)]
struct FileInfo {
    file: String,
    #[serde(flatten)]
    info: PresentationInfo,
}

fn format_info(input_path: &Path, file: &FileInfo) -> String {
    let info = &file.info;
    format!(
        "{}\n  Slides: {}\n  File size: {:.2} MB\n  Page size: {}\n",
        input_path.display(),
        info.slide_count,
        info.size_mb(),
        info.page_size_label().unwrap_or_else(|| "unknown".to_string())
    )
}

fn format_preset(preset: &StylePreset) -> String {
    let mut out = format!("{}\n  {}\n", preset.name, preset.description);
    for (label, rgb) in preset.palette() {
        out.push_str(&format!("  {:<10} {}\n", label, rgb));
    }
    out
}

/// Determine the output path for a restyled file.
fn get_output_path(input_path: &Path, style: &str, output_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let filename = input_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("presentation.pptx");

    let output_filename = output_filename(style, filename);

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => match input_path.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        },
    };

    Ok(output_path)
}

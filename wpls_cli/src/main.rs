//! `wpls` - create, extend and inspect WPLS canvas history files.
//!
//! ```bash
//! wpls create tile.png tile.wpls --x 12 --y 7
//! wpls append tile.wpls tile-later.png
//! wpls render tile.wpls out.png --at 1700000000
//! wpls info tile.wpls --json
//! ```

mod files;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use log::{error, LevelFilter};

use files::{load_image, read_document, save_image, write_document, CliError};
use lib_wpls::CanvasDocument;

#[derive(Parser)]
#[command(name = "wpls")]
#[command(about = "Palette canvas history files: one snapshot plus per-pixel deltas")]
#[command(version)]
struct Cli {
    /// Log progress (-v) or every block (-vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write log records to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new history from an image
    Create(CreateArgs),
    /// Record an image as the next state of an existing history
    Append(AppendArgs),
    /// Render the canvas as of a point in time
    Render(RenderArgs),
    /// Show header fields and the block timeline
    Info(InfoArgs),
}

#[derive(Args)]
struct CreateArgs {
    /// Source image (any format the image crate reads)
    image: PathBuf,
    /// Output history file
    output: PathBuf,
    /// Canvas origin, x
    #[arg(long, default_value_t = 0)]
    x: u16,
    /// Canvas origin, y
    #[arg(long, default_value_t = 0)]
    y: u16,
    /// Unix seconds for the base snapshot (defaults to now)
    #[arg(long)]
    timestamp: Option<u32>,
}

#[derive(Args)]
struct AppendArgs {
    /// History file to extend in place
    file: PathBuf,
    /// New state of the canvas
    image: PathBuf,
    /// Unix seconds for the delta (defaults to now)
    #[arg(long)]
    timestamp: Option<u32>,
}

#[derive(Args)]
struct RenderArgs {
    file: PathBuf,
    /// Output image, format chosen by extension
    output: PathBuf,
    /// Include deltas up to and including this unix timestamp
    #[arg(long)]
    at: Option<u32>,
}

#[derive(Args)]
struct InfoArgs {
    file: PathBuf,
    /// Print machine-readable JSON
    #[arg(long)]
    json: bool,
}

fn now() -> Result<u32, CliError> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| CliError::ClockOutOfRange)?
        .as_secs();
    u32::try_from(secs).map_err(|_| CliError::ClockOutOfRange)
}

fn create(args: CreateArgs) -> Result<(), CliError> {
    let image = load_image(&args.image)?;
    let timestamp = args.timestamp.map_or_else(now, Ok)?;

    let document = CanvasDocument::from_image(
        &image.pixels,
        image.width,
        image.height,
        args.x,
        args.y,
        timestamp,
    )?;
    write_document(&args.output, &document)?;

    println!(
        "Created {} ({}x{}, base at {})",
        args.output.display(),
        image.width,
        image.height,
        timestamp
    );
    Ok(())
}

fn append(args: AppendArgs) -> Result<(), CliError> {
    let mut document = read_document(&args.file)?;
    let image = load_image(&args.image)?;
    let timestamp = args.timestamp.map_or_else(now, Ok)?;

    if document.append_image(&image.pixels, image.width, image.height, timestamp)? {
        write_document(&args.file, &document)?;
        let changed = document.deltas().last().map_or(0, |delta| delta.records.len());
        println!("Appended delta at {} ({} pixels changed)", timestamp, changed);
    } else {
        println!("No changes, {} left untouched", args.file.display());
    }
    Ok(())
}

fn render(args: RenderArgs) -> Result<(), CliError> {
    let document = read_document(&args.file)?;
    let snapshot = document.snapshot_at(args.at.unwrap_or(u32::MAX))?;
    save_image(&args.output, snapshot.width, snapshot.height, &snapshot.pixels)?;

    println!(
        "Rendered {} as of {} to {}",
        args.file.display(),
        snapshot.timestamp,
        args.output.display()
    );
    Ok(())
}

fn info(args: InfoArgs) -> Result<(), CliError> {
    let document = read_document(&args.file)?;
    let metadata = document.metadata();

    if args.json {
        let blocks: Vec<_> = document
            .deltas()
            .iter()
            .map(|delta| {
                serde_json::json!({
                    "timestamp": delta.timestamp,
                    "changes": delta.records.len(),
                })
            })
            .collect();
        let report = serde_json::json!({ "metadata": metadata, "deltas": blocks });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", args.file.display());
    println!("  version:   {}", metadata.version);
    println!("  size:      {}x{}", metadata.width, metadata.height);
    println!("  origin:    ({}, {})", metadata.origin_x, metadata.origin_y);
    println!("  base:      {}", metadata.base_timestamp);
    println!("  latest:    {}", metadata.latest_timestamp);
    println!("  deltas:    {}", metadata.delta_count);
    for delta in document.deltas() {
        println!("    {:>10}  {} changes", delta.timestamp, delta.records.len());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if let Err(err) = lib_wpls::init_logging(level, cli.log_file.as_deref()) {
        eprintln!("Failed to open log file: {}", err);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Create(args) => create(args),
        Commands::Append(args) => append(args),
        Commands::Render(args) => render(args),
        Commands::Info(args) => info(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

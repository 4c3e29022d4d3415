//! Image Tagger CLI - AI-assisted keyword tagging for image libraries
//!
//! Command-line interface for the per-image tagging pipeline.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::inspect::InspectCommand;
use commands::tag::TagCommand;

#[derive(Parser)]
#[command(
    name = "image-tagger",
    version,
    about = "Tag images with AI-generated keywords",
    long_about = "Walk a directory of images, derive descriptive keyword tags for each image\n\
                  with a local AI inference service, and merge those tags into the images'\n\
                  embedded metadata attributes.",
    after_help = "EXAMPLES:\n  \
                  # Tag every image under a directory\n  \
                  image-tagger tag ~/Pictures/holiday\n\n  \
                  # See what would be written without touching any file\n  \
                  image-tagger tag --dry-run ~/Pictures/holiday\n\n  \
                  # Ask before applying tags to each image\n  \
                  image-tagger tag --confirm ~/Pictures/holiday\n\n  \
                  # Show the managed metadata attributes of one image\n  \
                  image-tagger inspect ~/Pictures/holiday/beach.jpg"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Tag every image under a directory
    Tag(TagCommand),

    /// Show the metadata attributes of a single image
    Inspect(InspectCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Tag(cmd) => cmd.execute().await,
        Commands::Inspect(cmd) => cmd.execute().await,
    }
}

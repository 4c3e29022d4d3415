//! Tag command implementation - sequential per-image pipeline runs

use anyhow::{Context as _, Result};
use clap::Args;
use image_tagger_core::config::{RunConfig, DEFAULT_MAX_RESOLUTION};
use image_tagger_core::pipeline::{PipelineOutcome, TaggerPipeline};
use image_tagger_core::services::{AlwaysApprove, ApplyGate};
use image_tagger_core::walker::image_files;
use image_tagger_exiftool::{ExifTool, DEFAULT_EXECUTABLE};
use image_tagger_inference::{OllamaClient, DEFAULT_HOST};
use std::io::{self, BufRead as _, Write as _};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Args)]
pub struct TagCommand {
    /// Directory containing images to tag
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Run every stage but write nothing to the images
    #[arg(long)]
    dry_run: bool,

    /// Ask before applying tags to each image
    #[arg(long)]
    confirm: bool,

    /// Vision model used to describe images
    #[arg(long, default_value = "llava")]
    vision_model: String,

    /// Language model used to generate tags from descriptions
    #[arg(long, default_value = "phi3")]
    tagger_model: String,

    /// Language to translate the tags into
    #[arg(long, default_value = "french")]
    lang: String,

    /// Ollama host root
    #[arg(long, env = "OLLAMA_HOST", default_value = DEFAULT_HOST)]
    host: String,

    /// Metadata tool executable
    #[arg(long, default_value = DEFAULT_EXECUTABLE)]
    exiftool: String,

    /// Timeout for a single inference or metadata-tool call, in seconds
    #[arg(long, default_value = "120")]
    timeout_secs: u64,
}

impl TagCommand {
    pub async fn execute(self) -> Result<()> {
        let timeout = Duration::from_secs(self.timeout_secs);

        // The metadata tool is load-bearing for every image: not being able
        // to run it at all is fatal to the whole run.
        let store = ExifTool::with_executable(&self.exiftool).with_timeout(timeout);
        let version = store
            .version()
            .await
            .with_context(|| format!("cannot run metadata tool '{}'", self.exiftool))?;
        info!("using exiftool {version}");

        // A missing inference server only fails per image, so warn and go on.
        let inference = OllamaClient::new(&self.host, timeout)
            .context("failed to build inference client")?;
        if let Err(err) = inference.probe().await {
            warn!("no inference service detected at {}: {err}", self.host);
        }

        let files = image_files(&self.directory).context("cannot enumerate images")?;

        if self.dry_run {
            info!("dry run: metadata writes are disabled");
        }

        let config = RunConfig {
            vision_model: self.vision_model.clone(),
            tagger_model: self.tagger_model.clone(),
            language: self.lang.clone(),
            dry_run: self.dry_run,
            max_resolution: DEFAULT_MAX_RESOLUTION,
        };

        let gate: Box<dyn ApplyGate> = if self.confirm {
            Box::new(ConsoleGate)
        } else {
            Box::new(AlwaysApprove)
        };

        let pipeline = TaggerPipeline::new(&inference, &store, gate.as_ref(), config);

        let mut total = 0usize;
        let mut applied = 0usize;
        let mut skipped = 0usize;
        let mut failed = 0usize;

        for path in files {
            total += 1;
            info!("processing {}", path.display());
            match pipeline.process(&path).await {
                PipelineOutcome::Applied { tags } => {
                    applied += 1;
                    info!("tagged {} with {:?}", path.display(), tags);
                }
                PipelineOutcome::Skipped => skipped += 1,
                PipelineOutcome::Failed(err) => {
                    failed += 1;
                    error!("{}: {} stage failed: {err}", path.display(), err.stage());
                }
            }
        }

        info!("=== Summary ===");
        info!("Images: {total}  Applied: {applied}  Skipped: {skipped}  Failed: {failed}");

        Ok(())
    }
}

/// Interactive y/N gate consulted once per image before the apply stage.
struct ConsoleGate;

impl ApplyGate for ConsoleGate {
    fn approve(&self, path: &Path, tags: &[String]) -> bool {
        print!("Apply {tags:?} to {}? [y/N] ", path.display());
        let _ = io::stdout().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

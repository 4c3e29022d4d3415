//! Inspect command implementation - dump an image's managed attributes

use anyhow::{Context as _, Result};
use clap::Args;
use image_tagger_common::Attribute;
use image_tagger_exiftool::{ExifTool, DEFAULT_EXECUTABLE};
use std::path::PathBuf;

#[derive(Args)]
pub struct InspectCommand {
    /// Image file to inspect
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Metadata tool executable
    #[arg(long, default_value = DEFAULT_EXECUTABLE)]
    exiftool: String,

    /// Also list every attribute name present on the file
    #[arg(long)]
    all: bool,
}

impl InspectCommand {
    pub async fn execute(self) -> Result<()> {
        let store = ExifTool::with_executable(&self.exiftool);
        store
            .version()
            .await
            .with_context(|| format!("cannot run metadata tool '{}'", self.exiftool))?;

        for attribute in Attribute::MANAGED {
            let values = store
                .read_attribute(&self.image, attribute)
                .await
                .with_context(|| format!("cannot read {attribute}"))?;
            if values.is_empty() {
                println!("{attribute}: (none)");
            } else {
                println!("{attribute}: {}", values.join(", "));
            }
        }

        if self.all {
            let names = store
                .list_attributes(&self.image)
                .await
                .context("cannot list attributes")?;
            println!();
            println!("All attributes ({}):", names.len());
            for name in names {
                println!("  {name}");
            }
        }

        Ok(())
    }
}

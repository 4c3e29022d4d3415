//! Per-image tagging pipeline
//!
//! A strictly sequential state machine:
//! optimize -> describe -> generate -> translate -> apply.
//! Any stage failure halts the image immediately; no stage is retried and
//! no state is re-entered. Stages before apply only read; all writes happen
//! in the apply stage through the merge engine.

use crate::config::RunConfig;
use crate::merge::apply_tags;
use crate::optimize::optimize_image;
use crate::services::{ApplyGate, Inference, InferenceRequest, MetadataStore, ResponseFormat};
use crate::tags::decode_tags;
use image_tagger_common::{StageError, TagFailure};
use std::path::Path;
use tracing::{debug, info};

/// Instruction for the vision stage.
const DESCRIBE_PROMPT: &str = "Briefly describe the notable objects in the following picture:";

fn generate_prompt(description: &str) -> String {
    format!(
        "You are an image tagging expert. You will be given the description of an image \
         in natural language and your task is to return a list of short keywords that best \
         describe the image. A keyword is composed of a single word, this is mandatory.\n\
         Return the keywords as a JSON parsable list of strings: [\"tag1\", \"tag2\", \"tag3\"]\n\
         If the description does not describe the image, return an empty list. Be concise.\n\n\
         For example:\n\
         Description: A person in front of a beautiful lake with trees around, frogs in the \
         front and water lilies on the water surface.\n\
         {{\"tags\": [\"person\", \"lake\", \"frog\", \"tree\", \"water lily\"]}}\n\n\
         ==========\n\n\
         Description: {description}"
    )
}

fn translate_prompt(tags: &[String], language: &str) -> String {
    let encoded = serde_json::to_string(tags).unwrap_or_default();
    format!(
        "Translate the following content into \"{}\". DO NOT alter the content, just \
         translate it. DO NOT change the JSON format of the list.\n\n\
         For example:\n\
         Tags: [\"person\", \"lake\", \"frog\", \"tree\", \"water lily\"]\n\
         {{\"tags\": [\"personne\", \"lac\", \"grenouille\", \"arbre\", \"nenuphar\"]}}\n\n\
         ==========\n\n\
         Tags: {encoded}",
        language.to_uppercase()
    )
}

/// Outcome of one image's pipeline run.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// Every managed attribute was merged and written (or, in a dry run,
    /// computed and logged)
    Applied { tags: Vec<String> },

    /// The operator declined the confirmation gate; nothing was written
    Skipped,

    /// A stage failed; no later stage ran
    Failed(StageError),
}

/// The per-image pipeline, wired to its two external collaborators and the
/// apply gate.
pub struct TaggerPipeline<'a> {
    inference: &'a dyn Inference,
    store: &'a dyn MetadataStore,
    gate: &'a dyn ApplyGate,
    config: RunConfig,
}

impl<'a> TaggerPipeline<'a> {
    pub fn new(
        inference: &'a dyn Inference,
        store: &'a dyn MetadataStore,
        gate: &'a dyn ApplyGate,
        config: RunConfig,
    ) -> Self {
        Self {
            inference,
            store,
            gate,
            config,
        }
    }

    /// Run the full pipeline for one image.
    pub async fn process(&self, path: &Path) -> PipelineOutcome {
        match self.run_stages(path).await {
            Ok(Some(tags)) => PipelineOutcome::Applied { tags },
            Ok(None) => {
                info!("skipped {} (not confirmed)", path.display());
                PipelineOutcome::Skipped
            }
            Err(err) => PipelineOutcome::Failed(err),
        }
    }

    async fn run_stages(&self, path: &Path) -> Result<Option<Vec<String>>, StageError> {
        debug!("optimizing {}", path.display());
        let payload = optimize_image(path, self.config.max_resolution)
            .map_err(|e| StageError::Optimize(e.to_string()))?;

        debug!("describing {}", path.display());
        let description = self.describe(payload).await.ok_or(StageError::Describe)?;
        debug!("description: {description}");

        debug!("generating tags for {}", path.display());
        let tags = self
            .generate(&description)
            .await
            .map_err(StageError::Generate)?;
        debug!("tags: {tags:?}");

        debug!("translating tags into {}", self.config.language);
        let translated = self.translate(&tags).await.map_err(StageError::Translate)?;
        debug!("translated tags: {translated:?}");

        if !self.gate.approve(path, &translated) {
            return Ok(None);
        }

        debug!("applying tags to {}", path.display());
        apply_tags(self.store, path, &translated, self.config.dry_run).await?;

        Ok(Some(translated))
    }

    async fn describe(&self, payload: Vec<u8>) -> Option<String> {
        let request =
            InferenceRequest::vision(&self.config.vision_model, DESCRIBE_PROMPT, payload);
        let response = self.inference.generate(request).await?;
        let description = response.trim().to_string();
        if description.is_empty() {
            None
        } else {
            Some(description)
        }
    }

    async fn generate(&self, description: &str) -> Result<Vec<String>, TagFailure> {
        let request =
            InferenceRequest::text(&self.config.tagger_model, generate_prompt(description));
        self.tag_list_call(request).await
    }

    async fn translate(&self, tags: &[String]) -> Result<Vec<String>, TagFailure> {
        let request = InferenceRequest::text(
            &self.config.tagger_model,
            translate_prompt(tags, &self.config.language),
        )
        .with_format(ResponseFormat::Json);
        self.tag_list_call(request).await
    }

    /// Shared decode path for the two tag-producing stages. An absent
    /// response, malformed JSON, and an empty list all abort the image.
    async fn tag_list_call(&self, request: InferenceRequest) -> Result<Vec<String>, TagFailure> {
        let raw = self
            .inference
            .generate(request)
            .await
            .ok_or(TagFailure::Absent)?;
        let tags = decode_tags(raw.trim())?;
        if tags.is_empty() {
            return Err(TagFailure::Empty);
        }
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_prompt_embeds_description() {
        let prompt = generate_prompt("A dog by a lake.");
        assert!(prompt.ends_with("Description: A dog by a lake."));
        assert!(prompt.contains("JSON parsable list"));
    }

    #[test]
    fn test_translate_prompt_embeds_tags_and_language() {
        let tags = vec!["dog".to_string(), "lake".to_string()];
        let prompt = translate_prompt(&tags, "french");
        assert!(prompt.contains("\"FRENCH\""));
        assert!(prompt.ends_with(r#"Tags: ["dog","lake"]"#));
    }
}

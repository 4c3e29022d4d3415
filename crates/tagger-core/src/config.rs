//! Run configuration for the tagging pipeline

/// Bounding resolution for image payloads sent to the vision model.
pub const DEFAULT_MAX_RESOLUTION: u32 = 256;

/// Configuration for one tagging run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Vision model used to describe images
    pub vision_model: String,

    /// Language model used to generate and translate tags
    pub tagger_model: String,

    /// Language the tags are translated into
    pub language: String,

    /// Run every stage but suppress all metadata writes
    pub dry_run: bool,

    /// Bounding resolution for the optimized payload
    pub max_resolution: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            vision_model: "llava".to_string(),
            tagger_model: "phi3".to_string(),
            language: "french".to_string(),
            dry_run: false,
            max_resolution: DEFAULT_MAX_RESOLUTION,
        }
    }
}

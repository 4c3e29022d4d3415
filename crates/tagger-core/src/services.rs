//! Capability traits for the pipeline's external collaborators
//!
//! The pipeline never talks to the AI service or the metadata tool directly;
//! it receives these two seams by reference. Production wires in the Ollama
//! client and the exiftool adapter, tests wire in scripted stand-ins.

use async_trait::async_trait;
use image_tagger_common::{Attribute, StoreError};
use std::path::Path;

/// Response format requested from the inference service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Free-form text
    #[default]
    Free,

    /// Strict JSON output
    Json,
}

/// One inference call: a model, a prompt, and optionally an image payload
/// for vision-mode calls.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub model: String,
    pub prompt: String,
    /// JPEG payload, present only in vision mode
    pub image: Option<Vec<u8>>,
    pub format: ResponseFormat,
}

impl InferenceRequest {
    /// Text-prompt mode request.
    pub fn text(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            image: None,
            format: ResponseFormat::Free,
        }
    }

    /// Vision mode request carrying an image payload.
    pub fn vision(model: impl Into<String>, prompt: impl Into<String>, image: Vec<u8>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            image: Some(image),
            format: ResponseFormat::Free,
        }
    }

    /// Override the requested response format.
    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }
}

/// Client for the AI inference service.
#[async_trait]
pub trait Inference: Send + Sync {
    /// Run one generation call to completion.
    ///
    /// Returns `None` for every transport error, timeout, or non-success
    /// response; the pipeline relies on that normalization to short-circuit
    /// without special-casing faults.
    async fn generate(&self, request: InferenceRequest) -> Option<String>;
}

/// Adapter over the external metadata tool for a single image path.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Current values of an attribute. An absent attribute reads back as an
    /// empty vec; `Err` means the tool itself could not run or the file is
    /// unreadable.
    async fn get_attribute(
        &self,
        path: &Path,
        attribute: Attribute,
    ) -> Result<Vec<String>, StoreError>;

    /// Replace the attribute's stored values with exactly `values`, in
    /// order. All-or-nothing per attribute; this is the only write
    /// primitive the merge engine uses.
    async fn replace_attribute(
        &self,
        path: &Path,
        attribute: Attribute,
        values: &[String],
    ) -> Result<(), StoreError>;
}

/// Gate consulted once per image before the apply stage.
pub trait ApplyGate: Send + Sync {
    fn approve(&self, path: &Path, tags: &[String]) -> bool;
}

/// Gate that approves every image, used when no confirmation was requested.
pub struct AlwaysApprove;

impl ApplyGate for AlwaysApprove {
    fn approve(&self, _path: &Path, _tags: &[String]) -> bool {
        true
    }
}

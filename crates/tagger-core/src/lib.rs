//! Core tagging pipeline
//!
//! Everything with non-trivial state or ordering lives here: the tag merge
//! engine, the structured `Categories` encoding, image payload preparation,
//! image file discovery, and the strictly sequential per-image pipeline.
//!
//! The two external collaborators (the inference service and the metadata
//! tool) are reached only through the capability traits in [`services`], so
//! tests substitute deterministic stand-ins.

pub mod categories;
pub mod config;
pub mod merge;
pub mod optimize;
pub mod pipeline;
pub mod services;
pub mod tags;
pub mod walker;

pub use config::RunConfig;
pub use pipeline::{PipelineOutcome, TaggerPipeline};
pub use services::{ApplyGate, Inference, InferenceRequest, MetadataStore, ResponseFormat};

//! Ollama inference client
//!
//! Thin wrapper over a local Ollama server's generate endpoint. Every
//! transport error, timeout, and non-success response is normalized into an
//! absent result (`None`) after logging, so the pipeline short-circuits on
//! a failed stage without special-casing fault kinds. The underlying HTTP
//! client keeps its connection pool alive across calls, and `keep_alive`
//! asks the server to keep the model loaded between them.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image_tagger_core::services::{Inference, InferenceRequest, ResponseFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default Ollama host root.
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// How long the server keeps the model loaded between calls, in seconds.
const KEEP_ALIVE_SECS: u64 = 300;

/// Errors from the Ollama server or the transport beneath it
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Client for a local Ollama server.
pub struct OllamaClient {
    http: reqwest::Client,
    host: String,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
    stream: bool,
    keep_alive: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

#[derive(Deserialize)]
struct GenerateReply {
    response: String,
}

impl OllamaClient {
    /// Build a client for `host` with a per-request timeout. A hung server
    /// degrades into an absent response once the timeout fires.
    pub fn new(host: impl Into<String>, timeout: Duration) -> Result<Self, InferenceError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()?;

        let host = host.into().trim_end_matches('/').to_string();
        Ok(Self { http, host })
    }

    /// Check that an Ollama server is reachable at the configured host.
    pub async fn probe(&self) -> Result<(), InferenceError> {
        let url = format!("{}/api/tags", self.host);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(InferenceError::Status(response.status()));
        }
        Ok(())
    }

    async fn generate_inner(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        let images = request
            .image
            .as_ref()
            .map(|bytes| vec![BASE64.encode(bytes)]);

        let body = GenerateBody {
            model: &request.model,
            prompt: &request.prompt,
            images,
            stream: false,
            keep_alive: KEEP_ALIVE_SECS,
            format: match request.format {
                ResponseFormat::Json => Some("json"),
                ResponseFormat::Free => None,
            },
        };

        let url = format!("{}/api/generate", self.host);
        debug!("POST {url} (model: {})", request.model);

        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(InferenceError::Status(response.status()));
        }

        let reply: GenerateReply = response.json().await?;
        Ok(reply.response)
    }
}

#[async_trait]
impl Inference for OllamaClient {
    async fn generate(&self, request: InferenceRequest) -> Option<String> {
        match self.generate_inner(&request).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!("inference request failed: {err}");
                None
            }
        }
    }
}

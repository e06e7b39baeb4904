//! Inference: send one page image to a vision model and read back its text.
//!
//! [`OcrEngine`] is the seam between the driver and whatever answers the
//! request. The shipped implementation, [`OllamaClient`], talks to Ollama's
//! `/api/generate` endpoint with a non-streaming request:
//!
//! ```text
//! POST <server_url>
//! Content-Type: application/json
//!
//! {"model": "...", "prompt": "...", "stream": false, "images": ["<base64 png>"]}
//! ```
//!
//! Only the `response` field of the reply is read. A missing or `null`
//! field means the model produced no text, which is not an error.
//!
//! One attempt per page: no retries, no backoff, no client timeout beyond
//! reqwest's defaults.

use crate::config::OcrConfig;
use crate::error::{InferenceError, OcrError};
use crate::pipeline::encode::EncodedImage;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Something that turns an encoded page image into text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Run the model on one image. `Ok("")` means the model returned no text.
    async fn extract_text(&self, image: &EncodedImage, prompt: &str) -> Result<String, InferenceError>;
}

/// Request body for Ollama's `generate` endpoint.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub images: [&'a str; 1],
}

impl<'a> GenerateRequest<'a> {
    pub fn new(model: &'a str, prompt: &'a str, image: &'a EncodedImage) -> Self {
        Self {
            model,
            prompt,
            stream: false,
            images: [image.as_str()],
        }
    }
}

/// The subset of the `generate` reply we care about.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
}

impl GenerateResponse {
    /// Extracted text, empty when the field was absent or null.
    pub fn into_text(self) -> String {
        self.response.unwrap_or_default()
    }
}

/// Async HTTP client for an Ollama-compatible server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaClient {
    /// Build a client for `endpoint` that requests `model`.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| OcrError::HttpClient(e.to_string()))?;
        Ok(Self::with_client(client, endpoint, model))
    }

    /// Build a client from an existing `reqwest::Client`.
    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    /// Build a client from the `server_url` and `model` in `config`.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        Self::new(&config.server_url, &config.model)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl OcrEngine for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn extract_text(&self, image: &EncodedImage, prompt: &str) -> Result<String, InferenceError> {
        let body = GenerateRequest::new(&self.model, prompt, image);
        debug!(
            "POST {} model={} image={} bytes",
            self.endpoint,
            self.model,
            image.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Transport {
                endpoint: self.endpoint.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| InferenceError::Transport {
            endpoint: self.endpoint.clone(),
            source: e,
        })?;
        let parsed: GenerateResponse =
            serde_json::from_slice(&bytes).map_err(|e| InferenceError::Decode(e.to_string()))?;

        Ok(parsed.into_text())
    }
}

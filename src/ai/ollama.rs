//! Ollama local LLM integration.
//!
//! Implements the AIProvider trait for Ollama, for running without a
//! hosted API key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{AIError, AIProvider};

/// Ollama API provider for local LLM.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider.
    ///
    /// Uses localhost:11434 unless `OLLAMA_HOST` is set.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: std::env::var("OLLAMA_HOST")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
        })
    }

    /// Create with a specific base URL.
    ///
    /// The hosted Gemini default is ignored so a shared `[ai]` section can
    /// switch providers by name alone.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if !url.contains("googleapis.com") {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }

    /// Create with a specific model. Gemini model names are ignored.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        if !model.starts_with("gemini") {
            self.model = model;
        }
        self
    }
}

#[async_trait]
impl AIProvider for OllamaProvider {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AIError::ApiError { status, body }.into());
        }

        let response: OllamaResponse = response.json().await.map_err(reqwest::Error::without_url)?;
        if response.response.trim().is_empty() {
            return Err(AIError::NoResponse.into());
        }
        Ok(response.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama API request structure.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// Ollama API response structure.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

//! Generative-text integration.
//!
//! Outlines, articles and drafts are all produced from a single prompt
//! call against one configured provider. There is no fallback chain and no
//! retry; callers decide what a failure means for the user.

mod gemini;
mod ollama;

use std::sync::Arc;

pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;

use async_trait::async_trait;

use crate::core::AiConfig;

/// Trait for AI providers.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Generate free-form text for a prompt.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

/// AI error types.
#[derive(Debug, thiserror::Error)]
pub enum AIError {
    #[error("Provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("No response from AI")]
    NoResponse,
}

/// Build the provider named in the configuration.
pub fn provider_from_config(config: &AiConfig) -> anyhow::Result<Arc<dyn AIProvider>> {
    match config.provider.as_str() {
        "gemini" => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| AIError::ProviderNotAvailable("GEMINI_API_KEY not set".into()))?;
            Ok(Arc::new(
                GeminiProvider::new(api_key, config.timeout())?
                    .with_model(&config.model)
                    .with_base_url(&config.base_url),
            ))
        }
        "ollama" => Ok(Arc::new(
            OllamaProvider::new(config.timeout())?
                .with_model(&config.model)
                .with_base_url(&config.base_url),
        )),
        other => Err(AIError::ProviderNotAvailable(format!("unknown provider '{other}'")).into()),
    }
}

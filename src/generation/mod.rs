// Answer generation back ends
// Both clients speak blocking HTTP through ureq and are driven from the
// blocking pool so callers stay async

pub mod extract;
pub mod gemini;
pub mod ollama;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

pub use gemini::GeminiGenerator;
pub use ollama::OllamaGenerator;

use crate::config::{Config, GenerationProvider};

/// A failed generation call. The message is what failure classification sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct GenerationError {
    message: String,
}

impl GenerationError {
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Opaque text-completion service
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short label used in logs
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Build the generator selected in the configuration
#[inline]
pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn Generator>> {
    let generation = &config.generation;
    let generator: Arc<dyn Generator> = match generation.provider {
        GenerationProvider::Ollama => {
            let base_url = config
                .ollama_url()
                .context("Failed to build Ollama URL for generation")?;
            Arc::new(OllamaGenerator::new(
                base_url,
                generation.model.clone(),
                generation.timeout(),
            ))
        }
        GenerationProvider::Gemini => {
            let api_key = generation
                .api_key()
                .context("Gemini generation needs an API key")?;
            let base_url = url::Url::parse(&generation.gemini_base_url)
                .context("Invalid Gemini base URL")?;
            Arc::new(GeminiGenerator::new(
                base_url,
                generation.model.clone(),
                api_key,
                generation.timeout(),
            ))
        }
    };

    debug!(
        "Using {} generator with model {}",
        generator.name(),
        generation.model
    );
    Ok(generator)
}

pub(crate) fn http_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// POST a JSON body and parse the JSON reply, reporting non-2xx replies as
/// `HTTP {status}: {body}`
pub(crate) fn post_json(
    agent: &ureq::Agent,
    url: &str,
    headers: &[(&str, &str)],
    body: &serde_json::Value,
) -> Result<serde_json::Value, GenerationError> {
    let payload = serde_json::to_string(body)
        .map_err(|e| GenerationError::new(format!("Failed to serialize request: {e}")))?;

    let mut request = agent.post(url).header("Content-Type", "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let mut response = request
        .send(payload.as_str())
        .map_err(|e| GenerationError::new(format!("Request failed: {e}")))?;

    let status = response.status().as_u16();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|e| GenerationError::new(format!("Failed to read response body: {e}")))?;

    if !(200..300).contains(&status) {
        return Err(GenerationError::new(format!("HTTP {status}: {}", text.trim())));
    }

    serde_json::from_str(&text)
        .map_err(|e| GenerationError::new(format!("Invalid JSON in response: {e}")))
}

/// Run a blocking generation call on the blocking pool
pub(crate) async fn run_blocking<F>(call: F) -> Result<String, GenerationError>
where
    F: FnOnce() -> Result<String, GenerationError> + Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| GenerationError::new(format!("Generation task failed: {e}")))?
}

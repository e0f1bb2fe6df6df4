use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::{GenerationError, Generator, extract::extract_text, http_agent, post_json, run_blocking};

/// Non-streaming completions from Ollama's `/api/generate`
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    base_url: Url,
    model: String,
    agent: ureq::Agent,
}

impl OllamaGenerator {
    #[inline]
    pub fn new(base_url: Url, model: String, timeout: Duration) -> Self {
        Self {
            base_url,
            model,
            agent: http_agent(timeout),
        }
    }

    /// Blocking variant of [`Generator::generate`]
    #[inline]
    pub fn generate_blocking(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = self
            .base_url
            .join("/api/generate")
            .map_err(|e| GenerationError::new(format!("Invalid Ollama URL: {e}")))?;

        debug!(
            "Requesting completion from {} ({} prompt chars)",
            self.model,
            prompt.chars().count()
        );

        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });
        let response = post_json(&self.agent, url.as_str(), &[], &body)?;

        if let Some(error) = response.get("error").and_then(|e| e.as_str()) {
            return Err(GenerationError::new(format!("Ollama error: {error}")));
        }

        extract_text(&response)
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let client = self.clone();
        let prompt = prompt.to_string();
        run_blocking(move || client.generate_blocking(&prompt)).await
    }
}

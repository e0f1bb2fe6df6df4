use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;
use url::Url;

use super::{GenerationError, Generator, extract::extract_text, http_agent, post_json, run_blocking};

/// Completions from the Gemini `generateContent` endpoint
#[derive(Clone)]
pub struct GeminiGenerator {
    base_url: Url,
    model: String,
    api_key: String,
    agent: ureq::Agent,
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GeminiGenerator {
    #[inline]
    pub fn new(base_url: Url, model: String, api_key: String, timeout: Duration) -> Self {
        Self {
            base_url,
            model,
            api_key,
            agent: http_agent(timeout),
        }
    }

    /// `generateContent` URL under the base, keeping any path prefix the base carries
    pub(crate) fn endpoint(&self) -> Result<Url, GenerationError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let prefix = format!("{}/", base.path());
            base.set_path(&prefix);
        }
        base.join(&format!("v1beta/models/{}:generateContent", self.model))
            .map_err(|e| GenerationError::new(format!("Invalid Gemini URL: {e}")))
    }

    /// Blocking variant of [`Generator::generate`]
    #[inline]
    pub fn generate_blocking(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = self.endpoint()?;

        debug!(
            "Requesting completion from {} ({} prompt chars)",
            self.model,
            prompt.chars().count()
        );

        let body = json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ]
        });
        let response = post_json(
            &self.agent,
            url.as_str(),
            &[("x-goog-api-key", self.api_key.as_str())],
            &body,
        )?;

        extract_text(&response)
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let client = self.clone();
        let prompt = prompt.to_string();
        run_blocking(move || client.generate_blocking(&prompt)).await
    }
}

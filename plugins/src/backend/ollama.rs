//! Ollama model backend: reachability and model-availability checks.
//!
//! The model itself is driven by the browser driver; this client only makes
//! sure the server the driver will talk to is up before a session starts.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use taskpilot_core::config::AgentConfig;
use taskpilot_core::error::SetupError;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature,
        }
    }

    pub fn from_config(cfg: &AgentConfig) -> Self {
        Self::new(cfg.ollama_url.clone(), cfg.model_name.clone(), cfg.temperature)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Names of the models installed on the server.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        tracing::debug!("Querying Ollama models: url={}", url);

        let response = self.client.get(&url).send().await.with_context(|| {
            format!(
                "Failed to reach Ollama at {}. Is Ollama running?",
                self.base_url
            )
        })?;

        let status = response.status();
        let tags: OllamaTagsResponse = response
            .error_for_status()
            .with_context(|| format!("Ollama returned error status: {}", status))?
            .json()
            .await
            .context("Failed to parse Ollama tags response")?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Fails with [`SetupError::Model`] if the server is unreachable or, when
    /// `verify_model` is set, the configured model is not installed.
    pub async fn probe(&self, verify_model: bool) -> Result<(), SetupError> {
        let models = self
            .list_models()
            .await
            .map_err(|e| SetupError::Model(format!("{:#}", e)))?;

        if verify_model && !models.iter().any(|m| model_matches(m, &self.model)) {
            return Err(SetupError::Model(format!(
                "model not found: {} (installed: {})",
                self.model,
                if models.is_empty() {
                    "none".to_string()
                } else {
                    models.join(", ")
                }
            )));
        }

        tracing::info!(model = %self.model, url = %self.base_url, "Ollama backend ready");
        Ok(())
    }
}

/// `deepseek` matches `deepseek`, `deepseek:latest` and `deepseek:7b`.
fn model_matches(installed: &str, wanted: &str) -> bool {
    if installed == wanted {
        return true;
    }
    if wanted.contains(':') {
        return false;
    }
    installed
        .split_once(':')
        .is_some_and(|(base, _tag)| base == wanted)
}

#[derive(Deserialize)]
struct OllamaTagsResponse {
    #[serde(default)]
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

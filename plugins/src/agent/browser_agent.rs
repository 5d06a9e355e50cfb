use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use taskpilot_core::config::AgentConfig;
use taskpilot_core::error::{LinkError, SetupError};
use taskpilot_core::link::AgentLink;

use crate::backend::ollama::OllamaClient;
use crate::runner::browser::{BrowserSession, BrowserSessionArgs, DriverRequest, LlmSpec};

pub const HEADLESS_ENV: &str = "TASKPILOT_HEADLESS";

/// Agent link backed by an Ollama model and a browser driver subprocess.
///
/// One driver process per link; `create` replaces any running one.
pub struct BrowserAgentLink {
    config: AgentConfig,
    ollama: OllamaClient,
    session: Option<BrowserSession>,
}

impl BrowserAgentLink {
    pub fn new(config: AgentConfig) -> Self {
        let ollama = OllamaClient::from_config(&config);
        Self {
            config,
            ollama,
            session: None,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn session_args(&self) -> BrowserSessionArgs {
        let mut envs = HashMap::new();
        envs.insert(
            HEADLESS_ENV.to_string(),
            if self.config.headless { "1" } else { "0" }.to_string(),
        );
        BrowserSessionArgs {
            cmd: self.config.browser_cmd.clone(),
            args: self.config.browser_args.clone(),
            envs,
            ready_timeout: Duration::from_millis(self.config.setup_timeout_ms.max(1)),
        }
    }
}

#[async_trait]
impl AgentLink for BrowserAgentLink {
    fn name(&self) -> &str {
        "browser-agent"
    }

    async fn create(&mut self) -> Result<(), SetupError> {
        self.close().await;

        tracing::info!(model = %self.config.model_name, "Creating browser agent");
        self.ollama.probe(self.config.verify_model).await?;

        let session = BrowserSession::launch(&self.session_args())
            .await
            .map_err(|e| SetupError::Browser(format!("{:#}", e)))?;
        self.session = Some(session);

        tracing::info!(
            "Browser session started ({})",
            if self.config.headless {
                "headless"
            } else {
                "visible"
            }
        );
        Ok(())
    }

    async fn run_task(&mut self, description: &str) -> Result<Value, LinkError> {
        if !self.is_connected() {
            self.create().await?;
        }
        let session = self.session.as_mut().ok_or(LinkError::Closed)?;

        tracing::info!("Running task: {}", description);
        let request = DriverRequest::Run {
            task: description,
            llm: LlmSpec {
                provider: "ollama",
                model: self.ollama.model(),
                base_url: self.ollama.base_url(),
                temperature: self.ollama.temperature(),
            },
        };
        let reply = session
            .request(&request)
            .await
            .map_err(|e| LinkError::Protocol(format!("{:#}", e)))?;

        if reply.ok {
            tracing::info!("Task finished");
            Ok(reply.history)
        } else {
            let message = reply
                .error
                .unwrap_or_else(|| "browser agent reported failure".to_string());
            tracing::warn!("Agent run failed: {}", message);
            Err(LinkError::Run(message))
        }
    }

    fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(BrowserSession::is_alive)
    }

    async fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.shutdown().await;
            tracing::info!("Browser session closed");
        }
    }
}

// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::{ModerationError, Result};

fn default_host() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "llama3:8b".to_string()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_secs() -> u64 {
    5
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Base URL of the Ollama-compatible server.
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Total attempts per message, including the first one.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Per-request HTTP timeout; local models can be slow on first load.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// `OLLAMA_HOST` / `OLLAMA_MODEL` win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = env::var("OLLAMA_HOST") {
            if !host.trim().is_empty() {
                self.host = host.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(model) = env::var("OLLAMA_MODEL") {
            if !model.trim().is_empty() {
                self.model = model.trim().to_string();
            }
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(ModerationError::Configuration(
                "ai.max_retries must be at least 1".into(),
            ));
        }
        if self.host.trim().is_empty() {
            return Err(ModerationError::Configuration("ai.host is empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ModerationError::Configuration(format!(
                "ai.temperature out of range: {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

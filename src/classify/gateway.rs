// src/classify/gateway.rs
//! Bounded-retry wrapper around a provider. `classify` never fails: once the
//! attempts are exhausted it hands back the neutral fail-safe.

use std::time::Duration;

use metrics::counter;
use tracing::{error, info, warn};

use crate::classify::ai_adapter::{parse_response, DynProvider};
use crate::classify::ClassificationResult;
use crate::config::AiConfig;
use crate::error::ModerationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Zero is treated as one.
    pub max_retries: u32,
    /// Fixed pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            delay,
        }
    }
}

impl From<&AiConfig> for RetryPolicy {
    fn from(cfg: &AiConfig) -> Self {
        Self::new(cfg.max_retries, cfg.retry_delay())
    }
}

pub struct ClassificationGateway {
    provider: DynProvider,
    retry: RetryPolicy,
}

impl ClassificationGateway {
    pub fn new(provider: DynProvider, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn classify(&self, text: &str) -> ClassificationResult {
        let attempts = self.retry.max_retries.max(1);
        for attempt in 1..=attempts {
            match self.attempt(text).await {
                Ok(result) => {
                    info!(
                        classification = %result.classification,
                        confidence = result.confidence as f64,
                        reason = %result.reason,
                        "AI classified message"
                    );
                    return result;
                }
                Err(e) => {
                    let kind = match &e {
                        ModerationError::MalformedResponse(_) => "malformed",
                        _ => "transport",
                    };
                    warn!(
                        provider = self.provider.name(),
                        attempt,
                        max = attempts,
                        kind,
                        error = %e,
                        "classification attempt failed"
                    );
                    if attempt < attempts && !self.retry.delay.is_zero() {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        error!(attempts, "all classification attempts exhausted, using fail-safe");
        counter!("moderator_classifier_failures_total").increment(1);
        ClassificationResult::fail_safe()
    }

    async fn attempt(&self, text: &str) -> Result<ClassificationResult, ModerationError> {
        let raw = self.provider.fetch(text).await?;
        parse_response(&raw)
    }
}

//! AI adapter: provider abstraction + response validation.
//! Providers only move text over the wire; the gateway owns retries.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::{Classification, ClassificationResult};
use crate::config::AiConfig;
use crate::error::ModerationError;

pub const SYSTEM_PROMPT: &str = r#"You are a content moderation AI. Analyze the social media post objectively.
Classify the post's tone and intent into one of three categories:

1. 'NEUTRAL': Normal conversation, questions, constructive criticism, positive remarks, or neutral statements.
2. 'MILDLY_NEGATIVE': Grumpy, sarcastic, dismissive, or passive-aggressive, but not directly abusive.
3. 'SEVERELY_NEGATIVE': Direct insults, harassment, hate speech, threats, toxic behavior, or aggressive spam.

IMPORTANT: Consider context. Political disagreement, criticism of ideas, or debate is NOT negative.
Focus on personal attacks, toxicity, and harassment.

Respond with valid JSON containing:
- "classification": One of the three categories above.
- "reason": A brief explanation (max 100 chars).
- "confidence": A number from 0.0 to 1.0 indicating your confidence.

Example:
{
  "classification": "SEVERELY_NEGATIVE",
  "reason": "Direct personal insult and threat",
  "confidence": 0.95
}"#;

const REQUIRED_KEYS: [&str; 3] = ["classification", "reason", "confidence"];

/// Low-level provider: does a *real* remote call and returns the raw model output.
pub trait Provider: Send + Sync + 'static {
    fn fetch<'a>(
        &'a self,
        input: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ModerationError>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

pub type DynProvider = Arc<dyn Provider>;

/// Factory honoring `AI_TEST_MODE=mock` for local runs without a model server.
pub fn build_provider(config: &AiConfig) -> DynProvider {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        tracing::warn!("AI_TEST_MODE=mock: every message is classified NEUTRAL");
        return Arc::new(MockProvider::neutral());
    }
    Arc::new(OllamaProvider::new(config))
}

// ------------------------------------------------------------
// Ollama
// ------------------------------------------------------------

/// Talks to an Ollama-compatible `/api/chat` endpoint in JSON mode.
pub struct OllamaProvider {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OllamaProvider {
    pub fn new(config: &AiConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mention-moderator/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: format!("{}/api/chat", config.host.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

impl Provider for OllamaProvider {
    fn fetch<'a>(
        &'a self,
        input: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ModerationError>> + Send + 'a>> {
        Box::pin(async move {
            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Options {
                temperature: f32,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
                stream: bool,
                format: &'a str,
                options: Options,
            }
            #[derive(Deserialize)]
            struct Resp {
                message: RespMsg,
            }
            #[derive(Deserialize)]
            struct RespMsg {
                content: String,
            }

            let req = Req {
                model: &self.model,
                messages: vec![
                    Msg {
                        role: "system",
                        content: SYSTEM_PROMPT,
                    },
                    Msg {
                        role: "user",
                        content: input,
                    },
                ],
                stream: false,
                format: "json",
                options: Options {
                    temperature: self.temperature,
                },
            };

            let resp = self.http.post(&self.endpoint).json(&req).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(ModerationError::TransientIo(format!(
                    "ollama returned HTTP {status}"
                )));
            }
            let body: Resp = resp.json().await.map_err(|e| {
                ModerationError::MalformedResponse(format!("ollama envelope: {e}"))
            })?;
            Ok(body.message.content)
        })
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

// ------------------------------------------------------------
// Mock
// ------------------------------------------------------------

/// Fixed answer for tests/local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl MockProvider {
    pub fn neutral() -> Self {
        Self {
            fixed: r#"{"classification":"NEUTRAL","reason":"mock","confidence":1.0}"#.to_string(),
        }
    }
}

impl Provider for MockProvider {
    fn fetch<'a>(
        &'a self,
        _input: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, ModerationError>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Validation
// ------------------------------------------------------------

/// Validate raw model output into a `ClassificationResult`.
///
/// Requires a JSON object with all three keys, a known classification literal
/// and a numeric confidence (a numeric string is accepted too).
pub fn parse_response(raw: &str) -> Result<ClassificationResult, ModerationError> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| ModerationError::MalformedResponse(format!("not JSON: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| ModerationError::MalformedResponse("not a JSON object".into()))?;

    let missing: Vec<&str> = REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|k| !obj.contains_key(*k))
        .collect();
    if !missing.is_empty() {
        return Err(ModerationError::MalformedResponse(format!(
            "missing required keys: {}",
            missing.join(", ")
        )));
    }

    let classification: Classification = obj["classification"]
        .as_str()
        .ok_or_else(|| ModerationError::MalformedResponse("classification is not a string".into()))?
        .parse::<Classification>()
        .map_err(ModerationError::MalformedResponse)?;

    let confidence = match &obj["confidence"] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|c| c.is_finite())
    .ok_or_else(|| ModerationError::MalformedResponse("confidence is not numeric".into()))?;

    let reason = match &obj["reason"] {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };

    Ok(ClassificationResult::new(
        classification,
        sanitize_reason(&reason),
        confidence as f32,
    ))
}

/// Single line, collapsed whitespace, at most 160 chars.
pub fn sanitize_reason(input: &str) -> String {
    let mut out = String::with_capacity(160);
    let mut prev_space = false;
    let mut n = 0usize;
    for ch in input.chars() {
        let c = if ch.is_whitespace() || ch.is_control() {
            ' '
        } else {
            ch
        };
        if c == ' ' {
            if !prev_space && !out.is_empty() {
                out.push(' ');
                n += 1;
            }
            prev_space = true;
        } else {
            out.push(c);
            n += 1;
            prev_space = false;
        }
        if n >= 160 {
            break;
        }
    }
    out.trim().to_string()
}

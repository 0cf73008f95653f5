// src/classify/mod.rs
//! Tone classification: result types, provider abstraction and the retrying gateway.

pub mod ai_adapter;
pub mod gateway;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use gateway::{ClassificationGateway, RetryPolicy};

pub const FAIL_SAFE_REASON: &str = "AI analysis failed - defaulting to safe classification";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Neutral,
    MildlyNegative,
    SeverelyNegative,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Neutral => "NEUTRAL",
            Classification::MildlyNegative => "MILDLY_NEGATIVE",
            Classification::SeverelyNegative => "SEVERELY_NEGATIVE",
        }
    }

    pub fn is_negative(self) -> bool {
        !matches!(self, Classification::Neutral)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    /// Exact match only; the model is told to answer with these literals.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEUTRAL" => Ok(Classification::Neutral),
            "MILDLY_NEGATIVE" => Ok(Classification::MildlyNegative),
            "SEVERELY_NEGATIVE" => Ok(Classification::SeverelyNegative),
            other => Err(format!("invalid classification: {other}")),
        }
    }
}

/// One verdict from the classifier. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub classification: Classification,
    pub reason: String,
    /// Within 0.0..=1.0.
    pub confidence: f32,
}

impl ClassificationResult {
    pub fn new(classification: Classification, reason: impl Into<String>, confidence: f32) -> Self {
        Self {
            classification,
            reason: reason.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Returned when every attempt failed. Confidence 0.0 can never pass the floor.
    pub fn fail_safe() -> Self {
        Self::new(Classification::Neutral, FAIL_SAFE_REASON, 0.0)
    }
}

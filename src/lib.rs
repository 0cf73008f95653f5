// src/lib.rs
// Public library surface for the daemon, the `post` CLI and integration tests.

pub mod classify;
pub mod config;
pub mod decision;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod social;
pub mod warning;

// ---- Re-exports for stable public API ----
pub use crate::classify::ai_adapter;
pub use crate::classify::{Classification, ClassificationGateway, ClassificationResult, RetryPolicy};
pub use crate::config::{AppConfig, PolicyConfig};
pub use crate::decision::{Action, Decision, DecisionPath};
pub use crate::error::ModerationError;
pub use crate::orchestrator::{BatchReport, Orchestrator};
pub use crate::social::{Author, Notification, SocialClient};

// src/social/mod.rs
//! Social-network collaborator: the types the loop consumes and the client trait.

pub mod cli_config;
pub mod mastodon;
pub mod text;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Visibility;
use crate::error::Result;

pub use mastodon::MastodonClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Opaque account id used for mute/block calls.
    pub id: String,
    /// `user@instance` (local accounts carry no instance part).
    pub handle: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// A mention of the monitored account, text already extracted from HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub status_id: String,
    pub author: Author,
    pub text: String,
}

#[async_trait::async_trait]
pub trait SocialClient: Send + Sync {
    /// Username of the authenticated account; used as the startup connectivity check.
    async fn verify_credentials(&self) -> Result<String>;

    /// Latest mentions, newest first (the order the server returns them).
    async fn fetch_mentions(&self) -> Result<Vec<Notification>>;

    async fn mute(&self, author_id: &str) -> Result<()>;

    async fn block(&self, author_id: &str) -> Result<()>;

    /// Reply to `status_id` with `text`.
    async fn send_warning(&self, status_id: &str, text: &str, visibility: Visibility)
        -> Result<()>;
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

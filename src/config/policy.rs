// src/config/policy.rs
//! Escalation policy settings. Immutable for the whole run.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{ModerationError, Result};

/// Visibility of the warning reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Direct,
    Private,
    Unlisted,
    Public,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Direct => "direct",
            Visibility::Private => "private",
            Visibility::Unlisted => "unlisted",
            Visibility::Public => "public",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Handles (`user@instance`) exempt from every action.
    #[serde(deserialize_with = "de_allowlist")]
    pub allowlist: Vec<String>,
    pub mute_threshold: u32,
    pub block_threshold: u32,
    /// Classifications below this confidence never act nor record.
    pub confidence_floor: f32,
    pub new_account_days: i64,
    pub new_account_instant_block: bool,
    pub new_account_no_warning: bool,
    pub send_warnings: bool,
    pub warning_visibility: Visibility,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowlist: Vec::new(),
            mute_threshold: 1,
            block_threshold: 3,
            confidence_floor: 0.6,
            new_account_days: 30,
            new_account_instant_block: true,
            new_account_no_warning: true,
            send_warnings: true,
            warning_visibility: Visibility::Direct,
        }
    }
}

impl PolicyConfig {
    pub fn with_allowlist<I, S>(mut self, handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowlist = clean_allowlist(handles);
        self
    }

    /// Case-insensitive; a leading `@` on either side is ignored.
    pub fn is_allowlisted(&self, handle: &str) -> bool {
        let h = normalize_handle(handle);
        self.allowlist.iter().any(|a| *a == h)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mute_threshold == 0 || self.block_threshold == 0 {
            return Err(ModerationError::Configuration(
                "mute_threshold and block_threshold must be at least 1".into(),
            ));
        }
        if self.mute_threshold > self.block_threshold {
            return Err(ModerationError::Configuration(format!(
                "mute_threshold ({}) exceeds block_threshold ({})",
                self.mute_threshold, self.block_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_floor) {
            return Err(ModerationError::Configuration(format!(
                "confidence_floor must be within 0.0..=1.0, got {}",
                self.confidence_floor
            )));
        }
        if self.new_account_days < 0 {
            return Err(ModerationError::Configuration(
                "new_account_days must not be negative".into(),
            ));
        }
        Ok(())
    }
}

pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_ascii_lowercase()
}

fn clean_allowlist<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let set: BTreeSet<String> = items
        .into_iter()
        .map(|s| normalize_handle(s.as_ref()))
        .filter(|s| !s.is_empty())
        .collect();
    set.into_iter().collect()
}

fn de_allowlist<'de, D>(de: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(de)?;
    Ok(clean_allowlist(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_is_trimmed_deduped_and_case_insensitive() {
        let p = PolicyConfig::default().with_allowlist([
            " Friend@mastodon.social ",
            "@friend@mastodon.social",
            "",
            "bot@botsin.space",
        ]);
        assert_eq!(
            p.allowlist,
            vec![
                "bot@botsin.space".to_string(),
                "friend@mastodon.social".to_string()
            ]
        );
        assert!(p.is_allowlisted("FRIEND@Mastodon.Social"));
        assert!(p.is_allowlisted("@bot@botsin.space"));
        assert!(!p.is_allowlisted("stranger@example.com"));
    }

    #[test]
    fn inverted_thresholds_fail_validation() {
        let p = PolicyConfig {
            mute_threshold: 4,
            block_threshold: 3,
            ..PolicyConfig::default()
        };
        assert!(p.validate().is_err());
        assert!(PolicyConfig::default().validate().is_ok());
    }

    #[test]
    fn floor_outside_unit_interval_fails_validation() {
        let p = PolicyConfig {
            confidence_floor: 1.5,
            ..PolicyConfig::default()
        };
        assert!(p.validate().is_err());
    }
}

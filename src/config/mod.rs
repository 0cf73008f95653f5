// src/config/mod.rs
//! Run configuration, loaded once at startup and never mutated afterwards.

pub mod ai;
pub mod policy;
pub mod social;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use ai::AiConfig;
pub use policy::{PolicyConfig, Visibility};
pub use social::SocialConfig;

pub const ENV_CONFIG_PATH: &str = "MODERATOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/moderator.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// When set, actions are only logged.
    pub dry_run: bool,
    pub poll_interval_secs: u64,
    pub processed_ids_file: PathBuf,
    pub infractions_file: PathBuf,
    /// e.g. "127.0.0.1:9898"; `None` disables the Prometheus endpoint.
    pub metrics_addr: Option<String>,
    /// Plain-text log appended next to console output. Empty disables it.
    pub log_file: Option<PathBuf>,
    pub policy: PolicyConfig,
    pub ai: AiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            poll_interval_secs: 300,
            processed_ids_file: PathBuf::from("processed_notification_ids.txt"),
            infractions_file: PathBuf::from("user_infractions.json"),
            metrics_addr: None,
            log_file: Some(PathBuf::from("mastodon_filter.log")),
            policy: PolicyConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing moderator config")?;
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// Resolution order:
    /// 1) $MODERATOR_CONFIG_PATH (must exist)
    /// 2) config/moderator.toml
    /// 3) built-in defaults
    ///
    /// Env overrides are applied and the result validated.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                anyhow::bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            tracing::info!("no config file found, using built-in defaults");
            Self::default()
        };
        cfg.ai.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(crate::error::ModerationError::Configuration(
                "poll_interval_secs must be at least 1".into(),
            ));
        }
        self.policy.validate()?;
        self.ai.validate()
    }

    pub fn log_file_path(&self) -> Option<&Path> {
        self.log_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert!(cfg.dry_run);
        assert_eq!(cfg.poll_interval_secs, 300);
        assert_eq!(cfg.policy.mute_threshold, 1);
        assert_eq!(cfg.policy.block_threshold, 3);
        assert!((cfg.policy.confidence_floor - 0.6).abs() < 1e-6);
        assert_eq!(cfg.ai.max_retries, 3);
        assert_eq!(cfg.ai.model, "llama3:8b");
        assert_eq!(cfg.log_file_path(), Some(Path::new("mastodon_filter.log")));
    }

    #[test]
    fn log_file_can_be_moved_or_disabled() {
        let cfg = AppConfig::from_toml_str(r#"log_file = "/var/log/moderator.log""#).unwrap();
        assert_eq!(cfg.log_file_path(), Some(Path::new("/var/log/moderator.log")));

        let cfg = AppConfig::from_toml_str(r#"log_file = """#).unwrap();
        assert_eq!(cfg.log_file_path(), None);
    }

    #[test]
    fn nested_sections_parse() {
        let s = r#"
            dry_run = false
            poll_interval_secs = 60

            [policy]
            allowlist = ["Friend@mastodon.social"]
            block_threshold = 5
            confidence_floor = 0.75
            warning_visibility = "unlisted"

            [ai]
            model = "mistral:7b"
            retry_delay_secs = 1
        "#;
        let cfg = AppConfig::from_toml_str(s).unwrap();
        assert!(!cfg.dry_run);
        assert_eq!(cfg.policy.block_threshold, 5);
        assert_eq!(cfg.policy.mute_threshold, 1);
        assert_eq!(cfg.policy.warning_visibility, Visibility::Unlisted);
        assert!(cfg.policy.is_allowlisted("friend@mastodon.social"));
        assert_eq!(cfg.ai.model, "mistral:7b");
        assert_eq!(cfg.ai.max_retries, 3);
        assert!(cfg.validate().is_ok());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_must_exist() {
        env::set_var(ENV_CONFIG_PATH, "/definitely/not/here.toml");
        let res = AppConfig::load_default();
        env::remove_var(ENV_CONFIG_PATH);
        assert!(res.is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_is_loaded_and_validated() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("moderator.toml");
        fs::write(&p, "[policy]\nmute_threshold = 4\nblock_threshold = 2\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        let res = AppConfig::load_default();
        env::remove_var(ENV_CONFIG_PATH);
        assert!(res.is_err(), "inverted thresholds must be rejected");
    }
}

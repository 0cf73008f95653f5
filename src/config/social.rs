// src/config/social.rs
use std::env;

use crate::error::{ModerationError, Result};

const ENV_TOKEN: &str = "MASTODON_ACCESS_TOKEN";
const ENV_BASE_URL: &str = "MASTODON_API_BASE_URL";

/// Credentials for the monitored account. Only ever read from the environment.
#[derive(Clone)]
pub struct SocialConfig {
    pub api_base_url: String,
    pub access_token: String,
}

impl std::fmt::Debug for SocialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocialConfig")
            .field("api_base_url", &self.api_base_url)
            .field("access_token", &format!("<{} chars>", self.access_token.len()))
            .finish()
    }
}

impl SocialConfig {
    pub fn new(api_base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim().trim_end_matches('/').to_string(),
            access_token: access_token.into().trim().to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let token = required(ENV_TOKEN)?;
        let base = required(ENV_BASE_URL)?;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ModerationError::Configuration(format!(
                "{ENV_BASE_URL} must start with http:// or https://"
            )));
        }
        Ok(Self::new(base, token))
    }
}

fn required(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ModerationError::Configuration(format!(
            "missing {key} env var"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn missing_token_is_a_configuration_error() {
        env::remove_var(ENV_TOKEN);
        env::set_var(ENV_BASE_URL, "https://mastodon.example");
        let err = SocialConfig::from_env().unwrap_err();
        env::remove_var(ENV_BASE_URL);
        assert!(matches!(err, ModerationError::Configuration(_)));
    }

    #[serial_test::serial]
    #[test]
    fn trailing_slash_is_stripped() {
        env::set_var(ENV_TOKEN, "abc123");
        env::set_var(ENV_BASE_URL, "https://mastodon.example/");
        let cfg = SocialConfig::from_env().unwrap();
        env::remove_var(ENV_TOKEN);
        env::remove_var(ENV_BASE_URL);
        assert_eq!(cfg.api_base_url, "https://mastodon.example");
        assert!(!format!("{cfg:?}").contains("abc123"));
    }
}

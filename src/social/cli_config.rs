// src/social/cli_config.rs
//! Credentials file for the `post` CLI: shell-style `KEY="value"` lines in
//! `~/.config/mastodon_cli.conf`.

use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SocialConfig;

#[derive(Clone, PartialEq, Eq)]
pub struct CliCredentials {
    pub instance_url: String,
    pub access_token: String,
}

impl std::fmt::Debug for CliCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliCredentials")
            .field("instance_url", &self.instance_url)
            .finish_non_exhaustive()
    }
}

impl CliCredentials {
    pub fn parse(content: &str) -> Result<Self> {
        let mut kv: HashMap<String, String> = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((k, v)) = line.split_once('=') else {
                continue;
            };
            let v = v.trim().trim_matches(|c: char| c == '"' || c == '\'');
            kv.insert(k.trim().to_ascii_lowercase(), v.to_string());
        }
        let instance_url = kv
            .remove("instance_url")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("INSTANCE_URL missing from credentials file"))?;
        let access_token = kv
            .remove("access_token")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("ACCESS_TOKEN missing from credentials file"))?;
        Ok(Self {
            instance_url,
            access_token,
        })
    }

    pub fn render(&self) -> String {
        format!(
            "INSTANCE_URL=\"{}\"\nACCESS_TOKEN=\"{}\"\n",
            self.instance_url, self.access_token
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| {
            format!(
                "no credentials at {} (run `post --setup` first)",
                path.display()
            )
        })?;
        Self::parse(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        fs::write(path, self.render()).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn to_social_config(&self) -> SocialConfig {
        SocialConfig::new(&self.instance_url, &self.access_token)
    }
}

/// `~/.config/mastodon_cli.conf`
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().ok_or_else(|| anyhow!("cannot locate home directory"))?;
    Ok(dirs.home_dir().join(".config").join("mastodon_cli.conf"))
}

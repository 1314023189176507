//! Repository and user configuration
//!
//! The repository `config` file carries the `[core]` section the engine
//! validates on open. User identity lives outside the repository in
//! `$XDG_CONFIG_HOME/ves/config` or `~/.vesconfig`; environment variables
//! (`VES_AUTHOR_NAME`, `VES_AUTHOR_EMAIL`, `VES_AUTHOR_DATE`) take
//! precedence over both, which also keeps tests deterministic.

use crate::artifacts::objects::commit::Signature;
use crate::error::VesError;
use anyhow::Context;
use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Repository-level configuration (`.ves/config`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    pub core: CoreSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreSection {
    pub repositoryformatversion: u32,
    pub filemode: bool,
    pub bare: bool,
}

impl Default for RepoConfig {
    fn default() -> Self {
        RepoConfig {
            core: CoreSection {
                repositoryformatversion: 0,
                filemode: false,
                bare: false,
            },
        }
    }
}

impl RepoConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        let config: RepoConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file at {}", path.display()))?;

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string(self).context("failed to serialize repository config")?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config file at {}", path.display()))?;

        Ok(())
    }

    /// Reject any format version this engine does not understand
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.core.repositoryformatversion != 0 {
            anyhow::bail!(VesError::UnsupportedFormat(
                self.core.repositoryformatversion
            ));
        }

        Ok(())
    }
}

/// User-level configuration carrying the commit identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    pub user: Option<UserSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSection {
    pub name: String,
    pub email: String,
}

impl UserConfig {
    /// Candidate paths, highest precedence first
    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        let config_home = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));
        if let Some(config_home) = config_home {
            paths.push(config_home.join("ves").join("config"));
        }
        if let Some(home) = std::env::var_os("HOME") {
            paths.push(PathBuf::from(home).join(".vesconfig"));
        }

        paths
    }

    pub fn load() -> anyhow::Result<Self> {
        for path in Self::candidate_paths() {
            if path.exists() {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file at {}", path.display()))?;
                let config: UserConfig = toml::from_str(&content)
                    .with_context(|| format!("failed to parse config file at {}", path.display()))?;
                if config.user.is_some() {
                    return Ok(config);
                }
            }
        }

        Ok(UserConfig::default())
    }
}

/// Resolve the identity used for new commits and annotated tags
///
/// Environment variables win over the user configuration; absence of both
/// is the missing-identity failure.
pub fn resolve_identity() -> anyhow::Result<Signature> {
    let env_name = std::env::var("VES_AUTHOR_NAME").ok();
    let env_email = std::env::var("VES_AUTHOR_EMAIL").ok();

    let (name, email) = match (env_name, env_email) {
        (Some(name), Some(email)) => (name, email),
        _ => {
            let config = UserConfig::load()?;
            match config.user {
                Some(user) => (user.name, user.email),
                None => anyhow::bail!(VesError::MissingIdentity),
            }
        }
    };

    let timestamp = match std::env::var("VES_AUTHOR_DATE") {
        Ok(date) => parse_author_date(&date)
            .with_context(|| format!("failed to parse VES_AUTHOR_DATE: {date}"))?,
        Err(_) => Local::now().fixed_offset(),
    };

    Ok(Signature::new(name, email, timestamp))
}

/// Accept RFC 2822, `YYYY-MM-DD HH:MM:SS ±HHMM`, or raw `seconds ±HHMM`
fn parse_author_date(date: &str) -> anyhow::Result<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(date) {
        return Ok(parsed);
    }
    if let Ok(parsed) = DateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(parsed);
    }

    // raw epoch form, the same shape commit headers use
    let identity_line = format!("_ <_> {date}");
    let signature = Signature::try_from(identity_line.as_str())?;
    Ok(signature.timestamp())
}

//! Configuration loading and parsing for `mergelog.toml` files.
//!
//! Every field is optional. A missing default file means built-in defaults;
//! secrets never live here and are read from the environment instead.
use color_eyre::eyre::{Context, eyre};
use log::*;
use serde::Deserialize;
use std::{env, path::Path};

use crate::result::Result;

/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "mergelog.toml";
/// Environment variable holding the optional generative-AI credential.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable the CLI falls back to for a GitHub token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_GEMINI_API_BASE: &str =
    "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-flash-lite-latest";

/// HTTP service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the service listens on.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.into(),
        }
    }
}

/// Settings for talking to the GitHub REST API.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// REST API base, change for GitHub Enterprise.
    pub api_base: String,
    /// Pull requests requested per page.
    pub page_size: u8,
    /// Commits fetched when a pull request body is blank.
    pub commit_sample: u8,
    /// Commit messages kept out of that sample.
    pub commit_keep: usize,
    /// Releases requested when matching release tags.
    pub release_page_size: u8,
    /// Upper bound for every single API call, in seconds.
    pub timeout_secs: u64,
    /// Pull requests enriched at the same time.
    pub enrich_concurrency: usize,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API_BASE.into(),
            page_size: 100,
            commit_sample: 10,
            commit_keep: 5,
            release_page_size: 100,
            timeout_secs: 30,
            enrich_concurrency: 4,
        }
    }
}

/// Settings for the narrative (generative-AI) changelog.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub api_base: String,
    pub model: String,
    pub timeout_secs: u64,
    /// Replaces the built-in professional style directive.
    pub default_style: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GEMINI_API_BASE.into(),
            model: DEFAULT_GEMINI_MODEL.into(),
            timeout_secs: 60,
            default_style: None,
        }
    }
}

/// Root configuration structure for `mergelog.toml`.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub github: GithubConfig,
    pub ai: AiConfig,
}

impl Config {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when
    /// no path is given. Only an explicitly requested file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        if !path.exists() {
            if explicit {
                return Err(eyre!(
                    "configuration file not found: {}",
                    path.display()
                ));
            }
            debug!("no configuration found: using default");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).wrap_err_with(|| {
            format!("failed to read configuration file {}", path.display())
        })?;

        let config = Self::parse(&content)?;
        info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .wrap_err("failed to parse configuration")?;

        if config.github.page_size == 0 {
            return Err(eyre!("github.page_size must be greater than 0"));
        }

        Ok(config)
    }
}

/// Reads a non-empty environment variable.
pub fn env_secret(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

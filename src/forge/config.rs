//! Connection settings for a forge client.
use secrecy::SecretString;
use std::time::Duration;

use crate::{config::GithubConfig, types::RepoRef};

/// Remote repository connection configuration.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// REST API base URL (e.g. "https://api.github.com").
    pub api_base: String,
    /// Repository the client is bound to.
    pub repo: RepoRef,
    /// Caller-supplied access token, passed through untouched.
    pub token: Option<SecretString>,
}

impl RemoteConfig {
    pub fn new(
        api_base: impl Into<String>,
        repo: RepoRef,
        token: Option<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            repo,
            token: token
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
        }
    }
}

/// Limits applied by the forge manager while fetching pull requests.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub page_size: u8,
    pub commit_sample: u8,
    pub commit_keep: usize,
    pub release_page_size: u8,
    pub timeout: Duration,
    pub concurrency: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self::from(&GithubConfig::default())
    }
}

impl From<&GithubConfig> for FetchSettings {
    fn from(config: &GithubConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            commit_sample: config.commit_sample,
            commit_keep: config.commit_keep,
            release_page_size: config.release_page_size.max(1),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            concurrency: config.enrich_concurrency.max(1),
        }
    }
}

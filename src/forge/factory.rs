//! Factory for creating forge managers bound to one repository.
use std::sync::Arc;

use crate::{
    config::GithubConfig,
    forge::{
        config::{FetchSettings, RemoteConfig},
        github::Github,
        manager::ForgeManager,
        traits::Forge,
    },
    result::Result,
    types::RepoRef,
};

type Connector = dyn Fn(RemoteConfig) -> Result<Box<dyn Forge>> + Send + Sync;

/// Creates a [`ForgeManager`] per request from shared settings. Tokens are
/// per caller, so nothing connection-specific is kept between requests.
#[derive(Clone)]
pub struct ForgeFactory {
    api_base: String,
    settings: FetchSettings,
    connect: Arc<Connector>,
}

impl ForgeFactory {
    /// Factory that talks to the GitHub REST API at `config.api_base`.
    pub fn github(config: &GithubConfig) -> Self {
        Self::with_connector(config, |remote| {
            Ok(Box::new(Github::new(remote)?) as Box<dyn Forge>)
        })
    }

    /// Factory using a custom forge constructor.
    pub fn with_connector(
        config: &GithubConfig,
        connect: impl Fn(RemoteConfig) -> Result<Box<dyn Forge>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            api_base: config.api_base.clone(),
            settings: FetchSettings::from(config),
            connect: Arc::new(connect),
        }
    }

    pub fn create(
        &self,
        repo: RepoRef,
        token: Option<String>,
    ) -> Result<ForgeManager> {
        let remote = RemoteConfig::new(self.api_base.clone(), repo, token);
        let forge = (self.connect)(remote)?;
        Ok(ForgeManager::new(forge, self.settings.clone()))
    }
}

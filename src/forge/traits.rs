//! Traits related to remote git forges
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::{
    forge::types::{ForgePull, RepoInfo},
    result::Result,
    types::{Issue, Release},
};

/// Read-only view of one repository on a forge.
///
/// Lookups that can legitimately miss return `Ok(None)`; `Err` is reserved
/// for transport and API failures.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Forge: Send + Sync {
    /// Look the repository up with the configured credentials.
    async fn get_repo(&self) -> Result<Option<RepoInfo>>;

    /// Look the repository up without any credentials.
    async fn get_repo_anonymous(&self) -> Result<Option<RepoInfo>>;

    /// One page (1-based) of closed pull requests, most recently updated first.
    async fn list_closed_pulls(
        &self,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<ForgePull>>;

    /// Messages of the first `per_page` commits of a pull request.
    async fn list_pull_commit_messages(
        &self,
        number: u64,
        per_page: u8,
    ) -> Result<Vec<String>>;

    async fn get_issue(&self, number: u64) -> Result<Option<Issue>>;

    async fn list_releases(&self, per_page: u8) -> Result<Vec<Release>>;
}

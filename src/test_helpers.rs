//! Common test helper functions shared across test modules.
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::future::pending;

use crate::{
    forge::{
        traits::Forge,
        types::{ForgePull, RepoInfo},
    },
    result::Result,
    types::{Issue, Release},
};

/// Which forge calls a [`StalledForge`] never answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// Repository lookups and the closed pull request listing.
    Primary,
    /// Commit, issue and release lookups.
    Auxiliary,
}

/// Forge that hangs forever on the calls selected by [`Stall`]. Answered
/// calls return one page with two pull requests merged on 2024-01-15:
/// #1 with body `Fixes #3`, #2 with a blank body.
pub struct StalledForge {
    pub stall: Stall,
}

impl StalledForge {
    pub fn new(stall: Stall) -> Self {
        Self { stall }
    }
}

fn merged_pull(number: u64, body: &str) -> ForgePull {
    ForgePull {
        number,
        title: format!("fix: stalled {number}"),
        body: body.into(),
        merged_at: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).single(),
        author: "octocat".into(),
        labels: vec![],
        html_url: format!("https://github.com/o/r/pull/{number}"),
    }
}

#[async_trait]
impl Forge for StalledForge {
    async fn get_repo(&self) -> Result<Option<RepoInfo>> {
        if self.stall == Stall::Primary {
            return pending().await;
        }
        Ok(Some(RepoInfo { private: false }))
    }

    async fn get_repo_anonymous(&self) -> Result<Option<RepoInfo>> {
        if self.stall == Stall::Primary {
            return pending().await;
        }
        Ok(Some(RepoInfo { private: false }))
    }

    async fn list_closed_pulls(
        &self,
        page: u32,
        _per_page: u8,
    ) -> Result<Vec<ForgePull>> {
        if self.stall == Stall::Primary {
            return pending().await;
        }
        if page > 1 {
            return Ok(vec![]);
        }
        Ok(vec![merged_pull(1, "Fixes #3"), merged_pull(2, "")])
    }

    async fn list_pull_commit_messages(
        &self,
        _number: u64,
        _per_page: u8,
    ) -> Result<Vec<String>> {
        if self.stall == Stall::Auxiliary {
            return pending().await;
        }
        Ok(vec![])
    }

    async fn get_issue(&self, _number: u64) -> Result<Option<Issue>> {
        if self.stall == Stall::Auxiliary {
            return pending().await;
        }
        Ok(None)
    }

    async fn list_releases(&self, _per_page: u8) -> Result<Vec<Release>> {
        if self.stall == Stall::Auxiliary {
            return pending().await;
        }
        Ok(vec![])
    }
}

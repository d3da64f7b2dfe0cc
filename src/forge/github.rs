//! Implements the Forge trait for Github
use async_trait::async_trait;
use color_eyre::eyre::eyre;
use log::*;
use octocrab::{Octocrab, params};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{
    forge::{
        config::RemoteConfig,
        traits::Forge,
        types::{ForgePull, RepoInfo},
    },
    result::Result,
    types::{Issue, Release},
};

/// Author login used when GitHub no longer knows the user (deleted account).
pub const UNKNOWN_AUTHOR: &str = "unknown";

#[derive(Debug, Serialize)]
struct PageParams {
    pub per_page: u8,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct PullCommit {
    pub commit: CommitDetail,
}

/// Maps a GitHub 404 to `Ok(None)` and keeps every other outcome.
fn not_found_as_none<T>(
    what: &str,
    result: std::result::Result<T, octocrab::Error>,
) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(octocrab::Error::GitHub { source, .. })
            if source.status_code == StatusCode::NOT_FOUND =>
        {
            debug!("{what}: not found");
            Ok(None)
        }
        Err(err) => Err(eyre!("GitHub API error: {what}: {err}")),
    }
}

/// GitHub forge implementation using Octocrab for API interactions with
/// repositories, pull requests, issues and releases.
pub struct Github {
    config: RemoteConfig,
    base_uri: String,
    instance: Octocrab,
    anonymous: Octocrab,
}

impl Github {
    /// Create a GitHub client bound to one repository. The token is optional:
    /// without it every call is made anonymously.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let base_uri = config.api_base.trim_end_matches('/').to_string();

        let mut builder = Octocrab::builder().base_uri(base_uri.clone())?;
        if let Some(token) = config.token.clone() {
            builder = builder.personal_token(token);
        }
        let instance = builder.build()?;

        let anonymous =
            Octocrab::builder().base_uri(base_uri.clone())?.build()?;

        Ok(Self {
            config,
            base_uri,
            instance,
            anonymous,
        })
    }

    async fn lookup_repo(&self, client: &Octocrab) -> Result<Option<RepoInfo>> {
        let repo = &self.config.repo;
        let result = client.repos(&repo.owner, &repo.repo).get().await;

        Ok(not_found_as_none(&format!("repository {repo}"), result)?.map(
            |data| RepoInfo {
                private: data.private.unwrap_or(false),
            },
        ))
    }
}

#[async_trait]
impl Forge for Github {
    async fn get_repo(&self) -> Result<Option<RepoInfo>> {
        self.lookup_repo(&self.instance).await
    }

    async fn get_repo_anonymous(&self) -> Result<Option<RepoInfo>> {
        self.lookup_repo(&self.anonymous).await
    }

    async fn list_closed_pulls(
        &self,
        page: u32,
        per_page: u8,
    ) -> Result<Vec<ForgePull>> {
        let repo = &self.config.repo;

        debug!("listing closed pull requests for {repo}: page {page}");

        let result = self
            .instance
            .pulls(&repo.owner, &repo.repo)
            .list()
            .state(params::State::Closed)
            .sort(params::pulls::Sort::Updated)
            .direction(params::Direction::Descending)
            .per_page(per_page)
            .page(page)
            .send()
            .await?;

        let pulls = result
            .items
            .into_iter()
            .map(|pr| ForgePull {
                number: pr.number,
                title: pr.title.unwrap_or_default(),
                body: pr.body.unwrap_or_default(),
                merged_at: pr.merged_at,
                author: pr
                    .user
                    .map(|u| u.login)
                    .unwrap_or_else(|| UNKNOWN_AUTHOR.into()),
                labels: pr
                    .labels
                    .unwrap_or_default()
                    .into_iter()
                    .map(|l| l.name)
                    .collect(),
                html_url: pr
                    .html_url
                    .map(|u| u.to_string())
                    .unwrap_or_default(),
            })
            .collect::<Vec<ForgePull>>();

        Ok(pulls)
    }

    async fn list_pull_commit_messages(
        &self,
        number: u64,
        per_page: u8,
    ) -> Result<Vec<String>> {
        let repo = &self.config.repo;
        let endpoint = format!(
            "{}/repos/{}/{}/pulls/{number}/commits",
            self.base_uri, repo.owner, repo.repo
        );

        let commits: Vec<PullCommit> = self
            .instance
            .get(endpoint, Some(&PageParams { per_page }))
            .await?;

        Ok(commits.into_iter().map(|c| c.commit.message).collect())
    }

    async fn get_issue(&self, number: u64) -> Result<Option<Issue>> {
        let repo = &self.config.repo;
        let result = self
            .instance
            .issues(&repo.owner, &repo.repo)
            .get(number)
            .await;

        Ok(not_found_as_none(&format!("issue #{number}"), result)?.map(
            |issue| Issue {
                number: issue.number,
                title: issue.title,
                html_url: issue.html_url.to_string(),
            },
        ))
    }

    async fn list_releases(&self, per_page: u8) -> Result<Vec<Release>> {
        let repo = &self.config.repo;

        let page = self
            .instance
            .repos(&repo.owner, &repo.repo)
            .releases()
            .list()
            .per_page(per_page)
            .send()
            .await?;

        Ok(page
            .items
            .into_iter()
            .map(|r| Release {
                tag: r.tag_name,
                published_at: r.published_at,
            })
            .collect())
    }
}

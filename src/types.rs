//! Data model shared by the fetcher, the renderers and the HTTP surface.
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::MergelogError;

/// Issue referenced from a pull request body, resolved against the forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

/// A merged pull request enriched with linked issues and its release tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    /// Original body, or recent commit messages when the body was blank.
    #[serde(default)]
    pub body: String,
    pub merged_at: DateTime<Utc>,
    pub author: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub html_url: String,
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Tag of the first release published at or after the merge, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
}

/// Published release, only kept around while matching pull requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub tag: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Result of probing a repository with and without credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    Public,
    Private,
    NotFound,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::NotFound => "not-found",
        };
        write!(f, "{s}")
    }
}

/// Narrows a list of pull requests by release status before rendering.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseFilter {
    #[default]
    All,
    Released,
    Unreleased,
}

impl ReleaseFilter {
    pub fn apply(&self, pulls: Vec<PullRequest>) -> Vec<PullRequest> {
        match self {
            ReleaseFilter::All => pulls,
            ReleaseFilter::Released => {
                pulls.into_iter().filter(|pr| pr.release.is_some()).collect()
            }
            ReleaseFilter::Unreleased => {
                pulls.into_iter().filter(|pr| pr.release.is_none()).collect()
            }
        }
    }
}

/// `owner/repo` pair identifying a repository on the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse the `owner/repo` shorthand.
    pub fn parse(slug: &str) -> Result<Self, MergelogError> {
        let mut parts = slug.trim().split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None)
                if !owner.is_empty() && !repo.is_empty() =>
            {
                Ok(Self::new(owner, repo))
            }
            _ => Err(MergelogError::invalid_input(format!(
                "repository must be in the form owner/repo, got: {slug}"
            ))),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Inclusive time window `[since, until]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Self, MergelogError> {
        if since > until {
            return Err(MergelogError::invalid_input(format!(
                "start date {since} is after end date {until}"
            )));
        }
        Ok(Self { since, until })
    }

    /// Parse the window from the date strings sent by callers.
    ///
    /// Each bound is either `YYYY-MM-DD` or RFC 3339. A date-only start is
    /// the first instant of that day (UTC), a date-only end the last one.
    pub fn parse(start: &str, end: &str) -> Result<Self, MergelogError> {
        let since = parse_bound(start, NaiveTime::MIN)?;
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            .unwrap_or(NaiveTime::MIN);
        let until = parse_bound(end, end_of_day)?;
        Self::new(since, until)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.since && instant <= self.until
    }
}

fn parse_bound(
    raw: &str,
    time_of_day: NaiveTime,
) -> Result<DateTime<Utc>, MergelogError> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Utc.from_utc_datetime(&date.and_time(time_of_day)));
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            MergelogError::invalid_input(format!(
                "invalid date: {raw} (expected YYYY-MM-DD or RFC 3339)"
            ))
        })
}

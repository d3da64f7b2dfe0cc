use chrono::{DateTime, Utc};

/// Repository metadata needed to answer visibility questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub private: bool,
}

/// Closed pull request as listed by the forge, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForgePull {
    pub number: u64,
    pub title: String,
    pub body: String,
    /// Absent when the pull request was closed without merging.
    pub merged_at: Option<DateTime<Utc>>,
    pub author: String,
    pub labels: Vec<String>,
    pub html_url: String,
}

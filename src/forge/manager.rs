//! Manager that wraps a forge implementation and turns its raw listings into
//! enriched pull requests.
use color_eyre::eyre::Report;
use futures::{StreamExt, stream};
use log::*;
use std::future::Future;

use crate::{
    error::MergelogError,
    forge::{config::FetchSettings, traits::Forge, types::ForgePull},
    issues::extract_issue_references,
    release::find_release_for,
    result::Result,
    types::{DateWindow, Issue, PullRequest, Release, Visibility},
};

pub struct ForgeManager {
    forge: Box<dyn Forge>,
    settings: FetchSettings,
}

impl ForgeManager {
    pub fn new(forge: Box<dyn Forge>, settings: FetchSettings) -> Self {
        Self { forge, settings }
    }

    /// Runs one forge call under the per-call timeout. A timeout comes back
    /// as [`MergelogError::UpstreamTimeout`] wrapped in the report.
    async fn bounded<T>(
        &self,
        what: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(MergelogError::upstream_timeout(format!(
                "{what} took longer than {:?}",
                self.settings.timeout
            ))
            .into()),
        }
    }

    /// True when the repository is reachable with the configured credentials.
    pub async fn validate(&self) -> bool {
        match self.bounded("get repository", self.forge.get_repo()).await {
            Ok(found) => found.is_some(),
            Err(err) => {
                warn!("failed to validate repository: {err}");
                false
            }
        }
    }

    /// Tells public, private and missing repositories apart. A 404 with
    /// credentials is retried anonymously before giving up.
    pub async fn check_visibility(&self) -> Visibility {
        match self.bounded("get repository", self.forge.get_repo()).await {
            Ok(Some(info)) if info.private => Visibility::Private,
            Ok(Some(_)) => Visibility::Public,
            Ok(None) => {
                debug!(
                    "repository not found with credentials: retrying anonymously"
                );
                match self
                    .bounded(
                        "get repository anonymously",
                        self.forge.get_repo_anonymous(),
                    )
                    .await
                {
                    Ok(Some(_)) => Visibility::Public,
                    Ok(None) => Visibility::NotFound,
                    Err(err) => {
                        warn!("anonymous repository lookup failed: {err}");
                        Visibility::NotFound
                    }
                }
            }
            Err(err) => {
                warn!("repository lookup failed: {err}");
                Visibility::NotFound
            }
        }
    }

    /// Fetches every pull request merged inside `window`, enriched with a
    /// body fallback, linked issues and the release that shipped it.
    ///
    /// Pages are read most recently updated first and reading stops at the
    /// first pull request merged before `window.since`. Update order only
    /// approximates merge order, so a pull request updated long after it
    /// was merged can hide older in-window merges on later pages.
    pub async fn fetch_pull_requests(
        &self,
        window: &DateWindow,
    ) -> std::result::Result<Vec<PullRequest>, MergelogError> {
        let releases = self.releases_in(window).await;
        let per_page = self.settings.page_size;

        let mut kept: Vec<ForgePull> = vec![];
        let mut page: u32 = 1;

        'pages: loop {
            let pulls = self
                .bounded(
                    "list closed pull requests",
                    self.forge.list_closed_pulls(page, per_page),
                )
                .await
                .map_err(into_fetch_error)?;

            let count = pulls.len();

            if count == 0 {
                break;
            }

            for pull in pulls {
                let Some(merged_at) = pull.merged_at else {
                    continue;
                };

                if window.contains(merged_at) {
                    kept.push(pull);
                } else if merged_at < window.since {
                    debug!(
                        "PR #{} merged before {}: stopping pagination",
                        pull.number, window.since
                    );
                    break 'pages;
                }
            }

            if count < per_page as usize {
                break;
            }

            page += 1;
        }

        info!("found {} merged pull requests in window", kept.len());

        let pull_requests = stream::iter(kept)
            .map(|pull| self.enrich(pull, &releases))
            .buffered(self.settings.concurrency)
            .filter_map(|pr| async move { pr })
            .collect::<Vec<PullRequest>>()
            .await;

        Ok(pull_requests)
    }

    /// Releases published inside the window; failures yield none.
    async fn releases_in(&self, window: &DateWindow) -> Vec<Release> {
        let result = self
            .bounded(
                "list releases",
                self.forge.list_releases(self.settings.release_page_size),
            )
            .await;

        match result {
            Ok(releases) => releases
                .into_iter()
                .filter(|r| {
                    r.published_at.is_some_and(|at| window.contains(at))
                })
                .collect(),
            Err(err) => {
                warn!("could not fetch releases: {err}");
                vec![]
            }
        }
    }

    async fn enrich(
        &self,
        pull: ForgePull,
        releases: &[Release],
    ) -> Option<PullRequest> {
        let merged_at = pull.merged_at?;

        let mut body = pull.body;

        if body.trim().is_empty()
            && let Some(messages) = self.commit_messages_body(pull.number).await
        {
            body = messages;
        }

        let issues = self.resolve_issues(pull.number, &body).await;
        let release = find_release_for(merged_at, releases);

        Some(PullRequest {
            number: pull.number,
            title: pull.title,
            body,
            merged_at,
            author: pull.author,
            labels: pull.labels,
            html_url: pull.html_url,
            issues,
            release,
        })
    }

    /// Recent non-merge commit messages joined as a stand-in body.
    async fn commit_messages_body(&self, number: u64) -> Option<String> {
        let result = self
            .bounded(
                "list pull request commits",
                self.forge.list_pull_commit_messages(
                    number,
                    self.settings.commit_sample,
                ),
            )
            .await;

        match result {
            Ok(messages) => {
                let messages = messages
                    .into_iter()
                    .filter(|m| !m.is_empty() && !m.starts_with("Merge"))
                    .take(self.settings.commit_keep)
                    .collect::<Vec<String>>();

                if messages.is_empty() {
                    None
                } else {
                    Some(messages.join("\n"))
                }
            }
            Err(err) => {
                warn!("could not fetch commits for PR #{number}: {err}");
                None
            }
        }
    }

    async fn resolve_issues(&self, pr_number: u64, body: &str) -> Vec<Issue> {
        let mut issues = vec![];

        for number in extract_issue_references(body) {
            let result = self
                .bounded("get issue", self.forge.get_issue(number))
                .await;

            match result {
                Ok(Some(issue)) => issues.push(issue),
                Ok(None) => {
                    warn!("PR #{pr_number}: issue #{number} does not exist")
                }
                Err(err) => {
                    warn!(
                        "PR #{pr_number}: could not fetch issue #{number}: {err}"
                    )
                }
            }
        }

        issues
    }
}

/// Collapses a pagination failure into the single error callers see,
/// keeping timeouts distinguishable.
fn into_fetch_error(err: Report) -> MergelogError {
    match err.downcast::<MergelogError>() {
        Ok(timeout @ MergelogError::UpstreamTimeout(_)) => timeout,
        Ok(other) => MergelogError::fetch_failed(other.to_string()),
        Err(err) => MergelogError::fetch_failed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        forge::{traits::MockForge, types::RepoInfo},
        test_helpers::{Stall, StalledForge},
    };
    use std::time::Duration;
    use chrono::{DateTime, TimeZone, Utc};
    use color_eyre::eyre::eyre;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    fn window() -> DateWindow {
        DateWindow::parse("2024-01-10", "2024-01-20").unwrap()
    }

    fn pull(number: u64, merged: Option<u32>, body: &str) -> ForgePull {
        ForgePull {
            number,
            title: format!("PR {number}"),
            body: body.into(),
            merged_at: merged.map(at),
            author: "octocat".into(),
            labels: vec![],
            html_url: format!("https://github.com/o/r/pull/{number}"),
        }
    }

    fn settings(page_size: u8) -> FetchSettings {
        FetchSettings {
            page_size,
            ..Default::default()
        }
    }

    fn manager(forge: MockForge, page_size: u8) -> ForgeManager {
        ForgeManager::new(Box::new(forge), settings(page_size))
    }

    #[tokio::test]
    async fn validate_reports_reachability() {
        let mut forge = MockForge::new();
        forge
            .expect_get_repo()
            .returning(|| Ok(Some(RepoInfo { private: false })));
        assert!(manager(forge, 100).validate().await);

        let mut forge = MockForge::new();
        forge.expect_get_repo().returning(|| Ok(None));
        assert!(!manager(forge, 100).validate().await);

        let mut forge = MockForge::new();
        forge.expect_get_repo().returning(|| Err(eyre!("500")));
        assert!(!manager(forge, 100).validate().await);
    }

    #[tokio::test]
    async fn visibility_from_authenticated_lookup() {
        let mut forge = MockForge::new();
        forge
            .expect_get_repo()
            .returning(|| Ok(Some(RepoInfo { private: true })));
        forge.expect_get_repo_anonymous().never();

        assert_eq!(
            manager(forge, 100).check_visibility().await,
            Visibility::Private
        );
    }

    #[tokio::test]
    async fn visibility_retries_anonymously_on_not_found() {
        let mut forge = MockForge::new();
        forge.expect_get_repo().returning(|| Ok(None));
        forge
            .expect_get_repo_anonymous()
            .times(1)
            .returning(|| Ok(Some(RepoInfo { private: false })));

        assert_eq!(
            manager(forge, 100).check_visibility().await,
            Visibility::Public
        );

        let mut forge = MockForge::new();
        forge.expect_get_repo().returning(|| Ok(None));
        forge.expect_get_repo_anonymous().returning(|| Ok(None));

        assert_eq!(
            manager(forge, 100).check_visibility().await,
            Visibility::NotFound
        );
    }

    #[tokio::test]
    async fn visibility_error_is_not_found() {
        let mut forge = MockForge::new();
        forge.expect_get_repo().returning(|| Err(eyre!("boom")));

        assert_eq!(
            manager(forge, 100).check_visibility().await,
            Visibility::NotFound
        );
    }

    #[tokio::test]
    async fn keeps_only_merged_pulls_inside_window() {
        let mut forge = MockForge::new();
        forge.expect_list_releases().returning(|_| Ok(vec![]));
        forge.expect_list_closed_pulls().times(1).returning(|page, _| {
            assert_eq!(page, 1);
            Ok(vec![
                pull(1, Some(25), "after window"),
                pull(2, None, "closed unmerged"),
                pull(3, Some(15), "inside"),
                pull(4, Some(10), "first day"),
            ])
        });

        let pulls = manager(forge, 100)
            .fetch_pull_requests(&window())
            .await
            .unwrap();

        let numbers = pulls.iter().map(|p| p.number).collect::<Vec<u64>>();
        assert_eq!(numbers, vec![3, 4]);
        assert_eq!(pulls[0].body, "inside");
        assert_eq!(pulls[0].release, None);
    }

    #[tokio::test]
    async fn pages_until_short_page() {
        let mut forge = MockForge::new();
        forge.expect_list_releases().returning(|_| Ok(vec![]));
        forge
            .expect_list_closed_pulls()
            .times(2)
            .returning(|page, per_page| {
                assert_eq!(per_page, 2);
                match page {
                    1 => Ok(vec![
                        pull(1, Some(18), "a"),
                        pull(2, Some(17), "b"),
                    ]),
                    2 => Ok(vec![pull(3, Some(16), "c")]),
                    _ => panic!("requested page {page} after a short page"),
                }
            });

        let pulls = manager(forge, 2)
            .fetch_pull_requests(&window())
            .await
            .unwrap();

        assert_eq!(pulls.len(), 3);
    }

    #[tokio::test]
    async fn stops_at_empty_page() {
        let mut forge = MockForge::new();
        forge.expect_list_releases().returning(|_| Ok(vec![]));
        forge
            .expect_list_closed_pulls()
            .times(2)
            .returning(|page, _| match page {
                1 => Ok(vec![pull(1, Some(18), "a"), pull(2, Some(17), "b")]),
                _ => Ok(vec![]),
            });

        let pulls = manager(forge, 2)
            .fetch_pull_requests(&window())
            .await
            .unwrap();

        assert_eq!(pulls.len(), 2);
    }

    #[tokio::test]
    async fn stops_at_first_pull_merged_before_window() {
        let mut forge = MockForge::new();
        forge.expect_list_releases().returning(|_| Ok(vec![]));
        forge.expect_list_closed_pulls().times(1).returning(|_, _| {
            Ok(vec![
                pull(1, Some(12), "a"),
                pull(2, Some(5), "too old"),
                pull(3, Some(11), "never reached"),
            ])
        });

        let pulls = manager(forge, 3)
            .fetch_pull_requests(&window())
            .await
            .unwrap();

        let numbers = pulls.iter().map(|p| p.number).collect::<Vec<u64>>();
        assert_eq!(numbers, vec![1]);
    }

    #[tokio::test]
    async fn pagination_failure_aborts_fetch() {
        let mut forge = MockForge::new();
        forge.expect_list_releases().returning(|_| Ok(vec![]));
        forge
            .expect_list_closed_pulls()
            .returning(|_, _| Err(eyre!("502 bad gateway")));

        let err = manager(forge, 100)
            .fetch_pull_requests(&window())
            .await
            .unwrap_err();

        assert!(matches!(err, MergelogError::FetchFailed(_)));
    }

    #[tokio::test]
    async fn blank_body_falls_back_to_commit_messages() {
        let mut forge = MockForge::new();
        forge.expect_list_releases().returning(|_| Ok(vec![]));
        forge
            .expect_list_closed_pulls()
            .returning(|_, _| Ok(vec![pull(7, Some(15), "  \n ")]));
        forge
            .expect_list_pull_commit_messages()
            .withf(|number, per_page| *number == 7 && *per_page == 10)
            .returning(|_, _| {
                Ok(vec![
                    "Merge branch 'main' into feature".into(),
                    "add parser".into(),
                    "fix #3 in parser".into(),
                    "tests".into(),
                    "docs".into(),
                    "lint".into(),
                    "one too many".into(),
                ])
            });
        forge.expect_get_issue().returning(|number| {
            Ok(Some(Issue {
                number,
                title: "Parser crash".into(),
                html_url: format!("https://github.com/o/r/issues/{number}"),
            }))
        });

        let pulls = manager(forge, 100)
            .fetch_pull_requests(&window())
            .await
            .unwrap();

        assert_eq!(
            pulls[0].body,
            "add parser\nfix #3 in parser\ntests\ndocs\nlint"
        );
        assert_eq!(pulls[0].issues.len(), 1);
        assert_eq!(pulls[0].issues[0].number, 3);
    }

    #[tokio::test]
    async fn commit_fetch_failure_leaves_body_empty() {
        let mut forge = MockForge::new();
        forge.expect_list_releases().returning(|_| Ok(vec![]));
        forge
            .expect_list_closed_pulls()
            .returning(|_, _| Ok(vec![pull(7, Some(15), "")]));
        forge
            .expect_list_pull_commit_messages()
            .returning(|_, _| Err(eyre!("403")));
        forge.expect_get_issue().never();

        let pulls = manager(forge, 100)
            .fetch_pull_requests(&window())
            .await
            .unwrap();

        assert_eq!(pulls.len(), 1);
        assert!(pulls[0].body.is_empty());
        assert!(pulls[0].issues.is_empty());
    }

    #[tokio::test]
    async fn unresolvable_issues_are_dropped() {
        let mut forge = MockForge::new();
        forge.expect_list_releases().returning(|_| Ok(vec![]));
        forge.expect_list_closed_pulls().returning(|_, _| {
            Ok(vec![pull(1, Some(15), "Closes #12, see #34 and #56")])
        });
        forge.expect_get_issue().returning(|number| match number {
            12 => Ok(Some(Issue {
                number: 12,
                title: "Crash on start".into(),
                html_url: "https://github.com/o/r/issues/12".into(),
            })),
            34 => Ok(None),
            _ => Err(eyre!("timeout")),
        });

        let pulls = manager(forge, 100)
            .fetch_pull_requests(&window())
            .await
            .unwrap();

        let issues = &pulls[0].issues;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].number, 12);
    }

    #[tokio::test]
    async fn matches_releases_published_in_window() {
        let mut forge = MockForge::new();
        forge.expect_list_releases().returning(|_| {
            Ok(vec![
                Release {
                    tag: "v0.9.0".into(),
                    published_at: Some(at(2)),
                },
                Release {
                    tag: "v1.0.0".into(),
                    published_at: Some(at(16)),
                },
                Release {
                    tag: "v1.1.0".into(),
                    published_at: Some(at(28)),
                },
            ])
        });
        forge.expect_list_closed_pulls().returning(|_, _| {
            Ok(vec![pull(2, Some(18), "late"), pull(1, Some(14), "early")])
        });

        let pulls = manager(forge, 100)
            .fetch_pull_requests(&window())
            .await
            .unwrap();

        // v1.1.0 is outside the window, so the late merge reads as unreleased
        assert_eq!(pulls[0].release, None);
        assert_eq!(pulls[1].release.as_deref(), Some("v1.0.0"));
    }

    #[tokio::test]
    async fn release_failure_is_not_fatal() {
        let mut forge = MockForge::new();
        forge
            .expect_list_releases()
            .returning(|_| Err(eyre!("releases unavailable")));
        forge
            .expect_list_closed_pulls()
            .returning(|_, _| Ok(vec![pull(1, Some(15), "body")]));

        let pulls = manager(forge, 100)
            .fetch_pull_requests(&window())
            .await
            .unwrap();

        assert_eq!(pulls.len(), 1);
        assert_eq!(pulls[0].release, None);
    }

    #[tokio::test]
    async fn concurrent_enrichment_keeps_page_order() {
        let mut forge = MockForge::new();
        forge.expect_list_releases().returning(|_| Ok(vec![]));
        forge.expect_list_closed_pulls().returning(|_, _| {
            Ok((1..=8).map(|n| pull(n, Some(19), "")).collect())
        });
        forge
            .expect_list_pull_commit_messages()
            .returning(|number, _| Ok(vec![format!("commit for {number}")]));

        let manager = ForgeManager::new(
            Box::new(forge),
            FetchSettings {
                concurrency: 3,
                ..Default::default()
            },
        );

        let pulls = manager.fetch_pull_requests(&window()).await.unwrap();

        let numbers = pulls.iter().map(|p| p.number).collect::<Vec<u64>>();
        assert_eq!(numbers, (1..=8).collect::<Vec<u64>>());
        assert_eq!(pulls[4].body, "commit for 5");
    }

    #[test]
    fn timeouts_stay_distinguishable() {
        let err = into_fetch_error(
            MergelogError::upstream_timeout("list closed pull requests").into(),
        );
        assert!(matches!(err, MergelogError::UpstreamTimeout(_)));

        let err = into_fetch_error(eyre!("connection reset"));
        assert!(matches!(err, MergelogError::FetchFailed(_)));
    }

    fn stalled(stall: Stall) -> ForgeManager {
        ForgeManager::new(
            Box::new(StalledForge::new(stall)),
            FetchSettings {
                timeout: Duration::from_secs(1),
                ..Default::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_pagination_is_an_upstream_timeout() {
        let err = stalled(Stall::Primary)
            .fetch_pull_requests(&window())
            .await
            .unwrap_err();

        assert!(matches!(err, MergelogError::UpstreamTimeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_repo_lookups_read_as_missing() {
        let manager = stalled(Stall::Primary);

        assert!(!manager.validate().await);
        assert_eq!(manager.check_visibility().await, Visibility::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_enrichment_degrades_each_pull() {
        let pulls = stalled(Stall::Auxiliary)
            .fetch_pull_requests(&window())
            .await
            .unwrap();

        assert_eq!(pulls.len(), 2);

        assert_eq!(pulls[0].number, 1);
        assert_eq!(pulls[0].body, "Fixes #3");
        assert!(pulls[0].issues.is_empty());

        assert_eq!(pulls[1].number, 2);
        assert_eq!(pulls[1].body, "");
        assert!(pulls.iter().all(|pr| pr.release.is_none()));
    }
}

//! Deterministic Markdown changelog grouped by category.
use chrono::NaiveDate;

use crate::{
    category::{CategorizedPulls, Category},
    types::{DateWindow, PullRequest},
};

/// Written instead of any section when there is nothing to report.
pub const NO_CHANGES_NOTICE: &str =
    "_No merged pull requests found in this period._";

/// Maximum characters of body shown under an entry.
pub const PREVIEW_MAX_CHARS: usize = 200;
/// Non-blank body lines considered for the preview.
pub const PREVIEW_MAX_LINES: usize = 3;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Renders the changelog for `pulls` merged within `window`.
///
/// Sections follow [`Category::ALL`] order, empty sections are left out and
/// entries inside a section are sorted by merge time, newest first.
pub fn render_markdown(
    pulls: &[PullRequest],
    window: &DateWindow,
    repo_name: &str,
) -> String {
    let categorized = CategorizedPulls::from_pulls(pulls);

    let mut markdown = format!(
        "# Changelog - {repo_name}\n\n## {} - {}\n\n",
        window.since.format(DATE_FORMAT),
        window.until.format(DATE_FORMAT),
    );

    for category in Category::ALL {
        let mut entries = categorized.get(category).to_vec();

        if entries.is_empty() {
            continue;
        }

        entries.sort_by(|a, b| b.merged_at.cmp(&a.merged_at));

        markdown.push_str(&format!("### {}\n\n", category.heading()));

        for pr in entries {
            markdown.push_str(&render_entry(pr));
        }

        markdown.push('\n');
    }

    if categorized.is_empty() {
        markdown.push_str(NO_CHANGES_NOTICE);
        markdown.push('\n');
    }

    markdown
}

fn render_entry(pr: &PullRequest) -> String {
    let release = match &pr.release {
        Some(tag) => format!("📦 *Released in {tag}*"),
        None => "⏳ *Not yet released*".to_string(),
    };

    let mut entry = format!(
        "- **[#{}]({})** {} (@{}) {release}\n",
        pr.number, pr.html_url, pr.title, pr.author
    );

    if let Some(preview) = body_preview(&pr.body) {
        entry.push_str(&format!("  {preview}\n"));
    }

    for issue in pr.issues.iter() {
        entry.push_str(&format!(
            "  - Closes [#{}]({}): {}\n",
            issue.number, issue.html_url, issue.title
        ));
    }

    entry.push('\n');
    entry
}

/// First few non-blank lines of `body` on one line, capped in length.
pub fn body_preview(body: &str) -> Option<String> {
    let joined = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(PREVIEW_MAX_LINES)
        .collect::<Vec<&str>>()
        .join(" ");

    if joined.is_empty() {
        return None;
    }

    if joined.chars().count() > PREVIEW_MAX_CHARS {
        let truncated =
            joined.chars().take(PREVIEW_MAX_CHARS).collect::<String>();
        return Some(format!("{truncated}..."));
    }

    Some(joined)
}

/// Download name for a changelog generated on `date`.
pub fn changelog_file_name(date: NaiveDate) -> String {
    format!("changelog-{}.md", date.format(DATE_FORMAT))
}

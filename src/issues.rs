//! Finds issue numbers referenced from free text such as a pull request body.
use regex::Regex;
use std::sync::LazyLock;

static CLOSING_REF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:close[sd]?|fix(?:e[sd])?|resolve[sd]?)\s+#(\d+)")
        .unwrap()
});

static PLAIN_REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)").unwrap());

/// Returns referenced issue numbers in first-seen order without duplicates.
///
/// Closing references ("Fixes #12") are collected first, then every plain
/// `#N` reference. Numbers are not validated here: the caller resolves each
/// one against the forge and drops what does not resolve.
pub fn extract_issue_references(text: &str) -> Vec<u64> {
    let mut numbers: Vec<u64> = vec![];

    for regex in [&*CLOSING_REF_REGEX, &*PLAIN_REF_REGEX] {
        for caps in regex.captures_iter(text) {
            // overflowing or zero references can't name an issue
            let Some(number) = caps[1].parse::<u64>().ok().filter(|n| *n > 0)
            else {
                continue;
            };
            if !numbers.contains(&number) {
                numbers.push(number);
            }
        }
    }

    numbers
}

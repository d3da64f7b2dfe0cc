//! Rule-based classification of pull requests into changelog sections.

use crate::types::PullRequest;

/// Changelog section a pull request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Features,
    BugFixes,
    Documentation,
    Chores,
    Other,
}

impl Category {
    /// Render order of the sections.
    pub const ALL: [Category; 5] = [
        Category::Features,
        Category::BugFixes,
        Category::Documentation,
        Category::Chores,
        Category::Other,
    ];

    pub fn heading(&self) -> &'static str {
        match self {
            Category::Features => "✨ Features",
            Category::BugFixes => "🐛 Bug Fixes",
            Category::Documentation => "📚 Documentation",
            Category::Chores => "🔧 Chores",
            Category::Other => "📦 Other Changes",
        }
    }

    /// Labels that select this category (compared lowercase).
    fn labels(&self) -> &'static [&'static str] {
        match self {
            Category::Features => &["feature", "enhancement"],
            Category::BugFixes => &["bug", "fix"],
            Category::Documentation => &["documentation", "docs"],
            Category::Chores => &["chore", "maintenance"],
            Category::Other => &[],
        }
    }

    /// Title prefixes that select this category (compared lowercase).
    fn title_prefixes(&self) -> &'static [&'static str] {
        match self {
            Category::Features => &["feat:", "feature:"],
            Category::BugFixes => &["fix:", "bugfix:"],
            Category::Documentation => &["docs:"],
            Category::Chores => &["chore:"],
            Category::Other => &[],
        }
    }

    fn matches(&self, title: &str, labels: &[String]) -> bool {
        labels.iter().any(|l| self.labels().contains(&l.as_str()))
            || self.title_prefixes().iter().any(|p| title.starts_with(p))
    }
}

/// Assigns exactly one category; the first matching rule in [`Category::ALL`]
/// order wins and `Other` catches the rest.
pub fn classify(pr: &PullRequest) -> Category {
    let title = pr.title.to_lowercase();
    let labels = pr
        .labels
        .iter()
        .map(|l| l.to_lowercase())
        .collect::<Vec<String>>();

    Category::ALL
        .into_iter()
        .find(|category| category.matches(&title, &labels))
        .unwrap_or(Category::Other)
}

/// Partition of pull requests by category. Every input lands in exactly one
/// bucket, keeping input order within the bucket.
#[derive(Debug, Default)]
pub struct CategorizedPulls<'a> {
    pub features: Vec<&'a PullRequest>,
    pub bug_fixes: Vec<&'a PullRequest>,
    pub documentation: Vec<&'a PullRequest>,
    pub chores: Vec<&'a PullRequest>,
    pub other: Vec<&'a PullRequest>,
}

impl<'a> CategorizedPulls<'a> {
    pub fn from_pulls(pulls: &'a [PullRequest]) -> Self {
        let mut categorized = Self::default();
        for pr in pulls {
            categorized.bucket_mut(classify(pr)).push(pr);
        }
        categorized
    }

    pub fn get(&self, category: Category) -> &[&'a PullRequest] {
        match category {
            Category::Features => &self.features,
            Category::BugFixes => &self.bug_fixes,
            Category::Documentation => &self.documentation,
            Category::Chores => &self.chores,
            Category::Other => &self.other,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<&'a PullRequest> {
        match category {
            Category::Features => &mut self.features,
            Category::BugFixes => &mut self.bug_fixes,
            Category::Documentation => &mut self.documentation,
            Category::Chores => &mut self.chores,
            Category::Other => &mut self.other,
        }
    }

    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

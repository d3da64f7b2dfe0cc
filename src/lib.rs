//! Changelogs from the pull requests merged into a GitHub repository.
//!
//! [`forge::manager::ForgeManager`] fetches and enriches merged pull
//! requests, [`changelog::render_markdown`] groups them into Markdown and
//! [`narrative::NarrativeGenerator`] optionally rewrites them as prose.

pub mod category;
pub mod changelog;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod forge;
pub mod issues;
pub mod narrative;
pub mod release;
pub mod result;
pub mod server;
pub mod types;

#[cfg(test)]
pub mod test_helpers;

pub use error::MergelogError;
pub use result::Result;

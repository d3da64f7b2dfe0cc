//! CLI argument parsing.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::{
    config::{GITHUB_TOKEN_ENV, env_secret},
    result::Result,
    types::{ReleaseFilter, RepoRef},
};

/// Global CLI arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, default_value_t = false, global = true)]
    /// Enable debug logging.
    pub debug: bool,

    #[arg(long, global = true)]
    /// Configuration file. Defaults to ./mergelog.toml when present.
    pub config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON HTTP API.
    Serve {
        #[arg(long)]
        /// Address to listen on. Overrides server.bind.
        bind: Option<String>,
    },

    /// Fetch merged pull requests and write a changelog.
    Generate(GenerateArgs),

    /// Report whether a repository is public, private or missing.
    Check(RepoArgs),
}

/// Repository selection shared by subcommands.
#[derive(clap::Args, Debug, Clone)]
pub struct RepoArgs {
    #[arg(long)]
    /// Repository as owner/repo.
    pub repo: String,

    #[arg(long, default_value = "")]
    /// GitHub personal access token. Falls back to GITHUB_TOKEN env var.
    pub github_token: String,
}

impl RepoArgs {
    pub fn repo_ref(&self) -> Result<RepoRef> {
        Ok(RepoRef::parse(&self.repo)?)
    }

    /// Explicit token, else `GITHUB_TOKEN`, else anonymous.
    pub fn token(&self) -> Option<String> {
        if !self.github_token.trim().is_empty() {
            return Some(self.github_token.clone());
        }

        env_secret(GITHUB_TOKEN_ENV)
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub remote: RepoArgs,

    #[arg(long)]
    /// First day of the window (YYYY-MM-DD or RFC 3339).
    pub since: String,

    #[arg(long)]
    /// Last day of the window, inclusive (YYYY-MM-DD or RFC 3339).
    pub until: String,

    #[arg(long)]
    /// Style directive for the narrative changelog.
    pub style: Option<String>,

    #[arg(long, value_enum, default_value_t = ReleaseFilter::All)]
    /// Keep all, only released or only unreleased pull requests.
    pub release_filter: ReleaseFilter,

    #[arg(long, short)]
    /// Output file. Defaults to changelog-<today>.md.
    pub output: Option<PathBuf>,

    #[arg(long, default_value_t = false, conflicts_with = "output")]
    /// Print the changelog instead of writing a file.
    pub stdout: bool,

    #[arg(long, default_value_t = false)]
    /// Skip the narrative model even when GEMINI_API_KEY is set.
    pub no_ai: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_command() {
        let args = Args::try_parse_from([
            "mergelog",
            "generate",
            "--repo",
            "octo/app",
            "--since",
            "2024-01-01",
            "--until",
            "2024-01-31",
            "--release-filter",
            "unreleased",
            "--no-ai",
            "--debug",
        ])
        .unwrap();

        assert!(args.debug);

        let Command::Generate(generate) = args.command else {
            panic!("expected generate command");
        };

        assert_eq!(generate.remote.repo, "octo/app");
        assert_eq!(generate.release_filter, ReleaseFilter::Unreleased);
        assert!(generate.no_ai);
        assert!(!generate.stdout);
        assert!(generate.output.is_none());
    }

    #[test]
    fn stdout_conflicts_with_output() {
        let result = Args::try_parse_from([
            "mergelog",
            "generate",
            "--repo",
            "o/r",
            "--since",
            "2024-01-01",
            "--until",
            "2024-01-02",
            "--stdout",
            "--output",
            "out.md",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn parses_serve_and_check() {
        let args = Args::try_parse_from([
            "mergelog",
            "--config",
            "custom.toml",
            "serve",
            "--bind",
            "0.0.0.0:8080",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("custom.toml")));
        assert!(matches!(
            args.command,
            Command::Serve { bind: Some(ref b) } if b == "0.0.0.0:8080"
        ));

        let args =
            Args::try_parse_from(["mergelog", "check", "--repo", "o/r"])
                .unwrap();
        assert!(matches!(args.command, Command::Check(_)));
    }

    #[test]
    fn explicit_token_wins() {
        let remote = RepoArgs {
            repo: "o/r".into(),
            github_token: "ghp_explicit".into(),
        };

        assert_eq!(remote.token().as_deref(), Some("ghp_explicit"));
        assert_eq!(remote.repo_ref().unwrap(), RepoRef::new("o", "r"));
    }

    #[test]
    fn rejects_malformed_repo() {
        let remote = RepoArgs {
            repo: "just-a-name".into(),
            github_token: String::new(),
        };

        assert!(remote.repo_ref().is_err());
    }
}

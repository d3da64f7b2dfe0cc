//! One-shot changelog generation to a file or stdout.
use chrono::Utc;
use color_eyre::eyre::Context;
use log::*;
use std::path::{Path, PathBuf};

use crate::{
    changelog::changelog_file_name,
    cli::GenerateArgs,
    config::Config,
    forge::factory::ForgeFactory,
    narrative::NarrativeGenerator,
    result::Result,
    types::DateWindow,
};

pub async fn execute(config: &Config, args: &GenerateArgs) -> Result<()> {
    let forges = ForgeFactory::github(&config.github);

    let narrative = if args.no_ai {
        NarrativeGenerator::new(None, &config.ai)
    } else {
        NarrativeGenerator::from_env(&config.ai)?
    };

    let changelog = build_changelog(args, &forges, &narrative).await?;

    if args.stdout {
        println!("{changelog}");
        return Ok(());
    }

    let path = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(changelog_file_name(Utc::now().date_naive()))
    });

    write_changelog(&path, &changelog).await?;

    info!("wrote changelog to {}", path.display());

    Ok(())
}

/// Fetches the window, applies the release filter and renders it.
async fn build_changelog(
    args: &GenerateArgs,
    forges: &ForgeFactory,
    narrative: &NarrativeGenerator,
) -> Result<String> {
    let repo = args.remote.repo_ref()?;
    let window = DateWindow::parse(&args.since, &args.until)?;

    let manager = forges.create(repo.clone(), args.remote.token())?;
    let pulls = manager.fetch_pull_requests(&window).await?;

    info!("found {} merged pull requests in {repo}", pulls.len());

    let pulls = args.release_filter.apply(pulls);

    Ok(narrative
        .generate(&pulls, &window, &repo.to_string(), args.style.as_deref())
        .await)
}

async fn write_changelog(path: &Path, changelog: &str) -> Result<()> {
    let mut content = changelog.to_string();

    if !content.ends_with('\n') {
        content.push('\n');
    }

    tokio::fs::write(path, content)
        .await
        .wrap_err_with(|| format!("failed to write {}", path.display()))
}

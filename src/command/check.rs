//! Prints whether a repository is public, private or missing.
use color_eyre::eyre::eyre;
use log::*;

use crate::{
    cli::RepoArgs,
    config::Config,
    forge::factory::ForgeFactory,
    result::Result,
    types::Visibility,
};

pub async fn execute(config: &Config, args: &RepoArgs) -> Result<()> {
    let forges = ForgeFactory::github(&config.github);
    let visibility = lookup_visibility(&forges, args).await?;

    println!("{}: {visibility}", args.repo);

    if visibility == Visibility::NotFound {
        return Err(eyre!("repository {} not found", args.repo));
    }

    Ok(())
}

async fn lookup_visibility(
    forges: &ForgeFactory,
    args: &RepoArgs,
) -> Result<Visibility> {
    let repo = args.repo_ref()?;

    debug!("checking visibility of {repo}");

    let manager = forges.create(repo, args.token())?;

    Ok(manager.check_visibility().await)
}

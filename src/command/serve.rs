//! Runs the HTTP API.
use std::sync::Arc;

use crate::{
    config::Config,
    forge::factory::ForgeFactory,
    narrative::NarrativeGenerator,
    result::Result,
    server::{self, AppState},
};

/// Serve on `bind`, or on the configured address when not given.
pub async fn execute(config: &Config, bind: Option<&str>) -> Result<()> {
    let bind = bind.unwrap_or(&config.server.bind);

    let state = AppState {
        forges: ForgeFactory::github(&config.github),
        narrative: Arc::new(NarrativeGenerator::from_env(&config.ai)?),
    };

    server::serve(bind, state).await
}

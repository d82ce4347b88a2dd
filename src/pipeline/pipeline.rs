// src/pipeline/pipeline.rs

use crate::error::Result;
use crate::models::{Config, PostsIndex};
use crate::utils::log;

use super::fetch::run_fetch;
use super::generate::run_generate;

/// Run the full build: fetch the remote posts, then regenerate the content index.
///
/// Generation only starts after a successful fetch.
pub async fn run_pipeline(config: &Config, skip_fetch: bool) -> Result<PostsIndex> {
    log::header("Building content");

    let total_steps = if skip_fetch { 1 } else { 2 };
    let mut current_step = 1;

    if !skip_fetch {
        log::step(current_step, total_steps, "Fetch - Mirroring remote posts");
        run_fetch(config).await?;
        current_step += 1;
    }

    log::step(current_step, total_steps, "Generate - Indexing posts");
    let index = run_generate(config).await?;

    log::success("Build complete");

    Ok(index)
}

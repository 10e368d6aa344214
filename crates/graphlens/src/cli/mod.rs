//! CLI command implementations.

mod display;

pub mod flows;
pub mod impact;
pub mod metrics;
pub mod render;

use std::path::Path;

use graphlens::{Snapshot, ViewConfig, ViewPipeline};

/// Load configuration from `path`, or defaults when no file was given.
pub async fn load_config(path: Option<&Path>) -> graphlens::Result<ViewConfig> {
    match path {
        Some(path) => ViewConfig::load(path).await,
        None => Ok(ViewConfig::default()),
    }
}

/// Load a snapshot and build a pipeline over it, reporting integrity warnings.
async fn open_pipeline(config: &ViewConfig, snapshot: &Path) -> graphlens::Result<ViewPipeline> {
    let snapshot = Snapshot::load(snapshot).await?;
    let pipeline = ViewPipeline::with_snapshot(config.clone(), snapshot);
    display::print_warnings(pipeline.warnings());
    Ok(pipeline)
}

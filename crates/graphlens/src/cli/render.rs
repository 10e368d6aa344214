//! `graphlens render` command implementation.

use std::path::Path;

use graphlens::{LayoutOrchestrator, ViewConfig, ViewParams};

/// Run the render command: build the view, lay it out, print JSON.
pub async fn run(config: &ViewConfig, snapshot: &Path, params: &ViewParams) -> graphlens::Result<()> {
    let pipeline = super::open_pipeline(config, snapshot).await?;
    let view = pipeline.build_view(params);

    let orchestrator = LayoutOrchestrator::with_layered_engine(config.layout);
    let render = orchestrator.compute(&view).await;

    println!("{}", serde_json::to_string_pretty(&render)?);
    Ok(())
}

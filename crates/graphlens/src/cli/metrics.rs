//! `graphlens metrics` command implementation.

use std::path::Path;

use colored::Colorize;
use graphlens::ViewConfig;

/// Run the metrics command.
pub async fn run(config: &ViewConfig, snapshot: &Path, top: usize) -> graphlens::Result<()> {
    let pipeline = super::open_pipeline(config, snapshot).await?;
    let metrics = pipeline.metrics();

    if metrics.is_empty() {
        println!("{}", "No symbols in snapshot.".dimmed());
        return Ok(());
    }

    println!(
        "Coupling metrics ({} symbols, max CBO {}):",
        metrics.len().to_string().cyan(),
        metrics.max_cbo().to_string().cyan()
    );
    println!();
    println!(
        "  {:>5} {:>5} {:>5} {:>6}  {}",
        "in".white().bold(),
        "out".white().bold(),
        "cbo".white().bold(),
        "score".white().bold(),
        "symbol".white().bold()
    );
    for (id, metric) in metrics.ranked().into_iter().take(top) {
        println!(
            "  {:>5} {:>5} {:>5} {:>6.2}  {id}",
            metric.in_degree, metric.out_degree, metric.cbo, metric.normalized_score
        );
    }

    if metrics.len() > top {
        println!();
        println!(
            "  {}",
            format!("... {} more (use --top to show more)", metrics.len() - top).dimmed()
        );
    }
    Ok(())
}

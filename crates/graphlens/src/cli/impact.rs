//! `graphlens impact` command implementation.

use std::path::Path;

use colored::Colorize;
use graphlens::{ImpactStats, ViewConfig};

use super::display::print_ids;

/// Run the impact command.
pub async fn run(config: &ViewConfig, snapshot: &Path, node_id: &str) -> graphlens::Result<()> {
    let pipeline = super::open_pipeline(config, snapshot).await?;
    let impact = pipeline.impact(node_id)?;

    let kind = pipeline
        .snapshot()
        .symbol_index()
        .get(node_id)
        .map_or("symbol", |symbol| symbol.kind.as_str());

    println!("Impact analysis for {kind} {}:", node_id.cyan().bold());
    print_impact_stats(&impact.stats);
    Ok(())
}

/// Display impact statistics.
fn print_impact_stats(stats: &ImpactStats) {
    println!();
    println!(
        "  {} functions, {} files, {} domains affected",
        stats.affected_functions.to_string().yellow(),
        stats.affected_files.to_string().yellow(),
        stats.affected_domains.to_string().yellow()
    );

    println!();
    println!(
        "  {} ({}):",
        "Upstream callers".white().bold(),
        stats.upstream.len().to_string().green()
    );
    print_ids(&stats.upstream, "(none)");

    println!();
    println!(
        "  {} ({}):",
        "Downstream callees".white().bold(),
        stats.downstream.len().to_string().green()
    );
    print_ids(&stats.downstream, "(none)");
}

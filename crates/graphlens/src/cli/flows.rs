//! `graphlens flows` command implementation.

use std::path::Path;

use colored::Colorize;
use graphlens::ViewConfig;

use super::display::print_ids;

/// Run the flows command.
pub async fn run(config: &ViewConfig, snapshot: &Path) -> graphlens::Result<()> {
    let pipeline = super::open_pipeline(config, snapshot).await?;
    let flows = pipeline.flows();

    if flows.is_empty() {
        println!("{}", "No execution flows detected.".green());
        return Ok(());
    }

    println!(
        "Found {} execution flow(s):",
        flows.len().to_string().cyan()
    );
    for flow in flows {
        println!();
        println!(
            "  {} [{}] reaches {} node(s)",
            flow.entry_point.white().bold(),
            flow.category.as_str().yellow(),
            flow.path.len() - 1
        );
        println!("  {}:", "Sinks".dimmed());
        print_ids(&flow.sinks, "(none)");
    }
    Ok(())
}

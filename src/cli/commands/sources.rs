//! Source listing command.

use console::style;

use crate::sources;

pub fn cmd_sources() -> anyhow::Result<()> {
    println!("Built-in sources:\n");
    for spec in sources::all()? {
        println!(
            "  {}  {} ({})",
            style(format!("{:<14}", spec.id)).bold(),
            spec.repository.name,
            spec.description
        );
    }
    println!("\nImport with: compilatio import <source> [--execute]");
    Ok(())
}

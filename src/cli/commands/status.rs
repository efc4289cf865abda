//! Status command.

use console::style;

use crate::config::ImportConfig;
use crate::repository::{self, RepositoryStore};

/// Per-repository manuscript counts.
pub fn cmd_status(config: &ImportConfig) -> anyhow::Result<()> {
    let conn = repository::connect_existing(&config.db_path)?;
    let rows = RepositoryStore::new(&conn).list_with_counts()?;

    if rows.is_empty() {
        println!("No repositories imported yet.");
        return Ok(());
    }

    let mut total = 0i64;
    println!("{:<44} {:>10}", style("Repository").bold(), style("MSS").bold());
    for (row, count) in &rows {
        println!("{:<44} {:>10}", row.info.name, count);
        total += count;
    }
    println!("{:<44} {:>10}", style("Total").bold(), style(total).bold());
    Ok(())
}

//! Initialize command.

use console::style;

use crate::config::ImportConfig;
use crate::repository;

/// Create the database file and schema.
pub fn cmd_init(config: &ImportConfig) -> anyhow::Result<()> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = repository::connect(&config.db_path)?;
    repository::init_schema(&conn)?;

    println!(
        "{} Initialized database at {}",
        style("✓").green(),
        config.db_path.display()
    );
    Ok(())
}

//! Import command.

use crate::config::ImportConfig;
use crate::importer::{ImportOptions, Importer};
use crate::sources;

pub async fn cmd_import(
    config: &ImportConfig,
    source_id: &str,
    opts: ImportOptions,
) -> anyhow::Result<()> {
    let spec = sources::find(source_id)?;

    println!("Compilatio import: {}", spec.repository.name);
    println!("DB:    {}", config.db_path.display());
    println!(
        "Cache: {}",
        config.discovery_cache_path(spec.id).display()
    );

    let mut mode_parts = Vec::new();
    if opts.discover_only {
        mode_parts.push("DISCOVER-ONLY");
    } else if opts.test {
        mode_parts.push("TEST");
    } else if opts.execute {
        mode_parts.push("EXECUTE");
    } else {
        mode_parts.push("DRY-RUN");
    }
    if opts.resume {
        mode_parts.push("RESUME");
    }
    if opts.skip_discovery {
        mode_parts.push("SKIP-DISCOVERY");
    }
    println!("Mode:  {}\n", mode_parts.join(" + "));

    let importer = Importer::new(config.clone());
    importer.run(&spec, &opts).await?;
    Ok(())
}

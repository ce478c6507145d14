//! The `elocute validate` command.

use std::path::PathBuf;

use anyhow::Result;

use elocute_core::parser;
use elocute_providers::load_config_from;

pub fn execute(catalog_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let catalog_path = catalog_path.unwrap_or_else(|| config.catalog.clone());

    let mut total_warnings = 0;

    for problem in config.validate() {
        println!("  [config] WARNING: {problem}");
        total_warnings += 1;
    }

    let catalog = parser::load_catalog(&catalog_path)?;
    println!(
        "Catalog: {} ({} levels, {} materials, {} badges)",
        catalog.name,
        catalog.levels.len(),
        catalog.materials.len(),
        catalog.badges.len()
    );

    let warnings = parser::validate_catalog(&catalog);
    for w in &warnings {
        let prefix = w
            .item_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }
    total_warnings += warnings.len();

    if total_warnings == 0 {
        println!("Catalog and config valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

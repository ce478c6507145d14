//! The `elocute progress` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use elocute_core::model::ProgressRecord;
use elocute_core::statistics::{class_stats, learner_stats, placement_level};
use elocute_core::traits::ProgressStore;
use elocute_providers::load_config_from;
use elocute_store::JsonFileStore;

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".to_string())
}

pub async fn execute(
    user: Option<String>,
    store_path: Option<PathBuf>,
    catalog_path: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = JsonFileStore::open(store_path.unwrap_or_else(|| config.store_path.clone()));
    let catalog = super::load_catalog_if_present(&catalog_path.unwrap_or_else(|| config.catalog.clone()))?;
    let records = store.all_progress().await?;

    match user {
        Some(user) => {
            let stats = learner_stats(&user, &records);
            let placement = catalog
                .as_ref()
                .and_then(|c| placement_level(&user, &records, c))
                .map(str::to_string);
            let badges = store.awarded_badges(&user).await?;

            if format == "json" {
                let json = serde_json::json!({
                    "stats": stats,
                    "placement": placement,
                    "badges": badges,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
                return Ok(());
            }

            println!("Learner: {user}");
            println!(
                "Readings: {} | Words: {} | Avg WPM: {} | Best WPM: {} | Avg accuracy: {}",
                stats.total_readings,
                stats.total_words,
                fmt_opt(stats.average_wpm),
                fmt_opt(stats.best_wpm),
                fmt_opt(stats.average_accuracy),
            );
            println!("Placement: {}", placement.as_deref().unwrap_or("not yet placed"));

            let own: Vec<&ProgressRecord> = records.iter().filter(|r| r.user == user).collect();
            if !own.is_empty() {
                let mut table = Table::new();
                table.set_header(vec!["Level", "Readings", "Words", "Avg WPM", "Avg accuracy", "Last reading"]);
                for r in own {
                    table.add_row(vec![
                        Cell::new(&r.level),
                        Cell::new(r.readings_completed),
                        Cell::new(r.total_words_read),
                        Cell::new(fmt_opt(r.average_wpm)),
                        Cell::new(fmt_opt(r.average_accuracy)),
                        Cell::new(
                            r.last_reading_date
                                .map(|d| d.format("%Y-%m-%d").to_string())
                                .unwrap_or_else(|| "-".into()),
                        ),
                    ]);
                }
                println!("{table}");
            }
            for badge in badges {
                println!("Badge: {} ({})", badge.badge_name, badge.date_earned.format("%Y-%m-%d"));
            }
        }
        None => {
            let Some(catalog) = catalog else {
                anyhow::bail!("class progress needs a catalog for level placement");
            };
            let stats = class_stats(&records, &catalog);
            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }

            println!(
                "Learners: {} | Readings: {} | Words: {} | Avg WPM: {} | Avg accuracy: {}",
                stats.learners,
                stats.total_readings,
                stats.total_words,
                fmt_opt(stats.average_wpm),
                fmt_opt(stats.average_accuracy),
            );
            let mut table = Table::new();
            table.set_header(vec!["Level", "Learners"]);
            for (level, count) in &stats.level_distribution {
                table.add_row(vec![Cell::new(level), Cell::new(count)]);
            }
            table.add_row(vec![Cell::new("(not placed)"), Cell::new(stats.unplaced)]);
            println!("{table}");
        }
    }
    Ok(())
}

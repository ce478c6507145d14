//! The `elocute init` command.

use std::path::Path;

use anyhow::{Context, Result};

pub fn execute() -> Result<()> {
    if Path::new("elocute.toml").exists() {
        println!("elocute.toml already exists, skipping.");
    } else {
        std::fs::write("elocute.toml", SAMPLE_CONFIG).context("failed to write elocute.toml")?;
        println!("Created elocute.toml");
    }

    std::fs::create_dir_all("catalogs").context("failed to create catalogs/")?;
    let catalog_path = Path::new("catalogs/starter.toml");
    if catalog_path.exists() {
        println!("catalogs/starter.toml already exists, skipping.");
    } else {
        std::fs::write(catalog_path, STARTER_CATALOG)
            .context("failed to write catalogs/starter.toml")?;
        println!("Created catalogs/starter.toml");
    }

    println!("\nNext steps:");
    println!("  1. Point [recognizer] in elocute.toml at your speech service, or pass transcripts");
    println!("  2. Run: elocute validate");
    println!("  3. Run: elocute session --user ana --material cat-on-mat --transcript \"the cat sat on the mat\"");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# elocute configuration

locale = "en-US"
store_path = "./elocute-data/progress.json"
catalog = "./catalogs"
output_dir = "./elocute-results"
parallelism = 4

# Transcripts are passed on the command line unless a recognizer is set.
[recognizer]
type = "none"

# [recognizer]
# type = "http"
# endpoint = "http://localhost:9000"
# api_key = "${ELOCUTE_RECOGNIZER_KEY}"
# timeout_secs = 30

[scoring]
fuzzy_threshold = 0.6
coarse_threshold = 0.5
problem_threshold = 70.0
mispronounced_below = 70
random_fallback = true
simulate_errors = false

[fluency]
low_wpm = 80.0
high_wpm = 160.0
ideal_wpm = 120.0
max_wpm = 200.0
"#;

const STARTER_CATALOG: &str = include_str!("../../../../catalogs/starter.toml");

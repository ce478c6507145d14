//! The `elocute fluency` command.

use std::path::PathBuf;

use anyhow::Result;

use elocute_core::fluency::compute_fluency_with;
use elocute_core::text;
use elocute_providers::load_config_from;

pub fn execute(
    words: Option<usize>,
    transcript: Option<String>,
    seconds: f64,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(seconds.is_finite() && seconds > 0.0, "--seconds must be positive");
    let config = load_config_from(config_path.as_deref())?;

    let word_count = match (words, transcript) {
        (Some(n), _) => n,
        (None, Some(t)) if text::is_no_speech(&t) => 0,
        (None, Some(t)) => text::word_count(&t),
        (None, None) => anyhow::bail!("pass --words or --transcript"),
    };

    let result = compute_fluency_with(&config.fluency, word_count, seconds);
    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            println!("Words: {word_count}");
            println!("Words per minute: {:.1}", result.wpm);
            println!("Fluency score: {}", result.rounded_score());
        }
    }
    Ok(())
}

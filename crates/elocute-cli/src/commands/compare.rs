//! The `elocute compare` command.

use std::path::PathBuf;

use anyhow::Result;

use elocute_core::report::SessionReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");
    let baseline = SessionReport::load_json(&baseline_path)?;
    let current = SessionReport::load_json(&current_path)?;

    if baseline.reference_text != current.reference_text {
        tracing::warn!("reports are readings of different texts; only shared words are compared");
    }

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Overall {:+.0} | Fluency {:+.1} | WPM {:+.1}",
                report.overall_delta, report.fluency_delta, report.wpm_delta
            );
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            if !report.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &report.regressions {
                    println!("  {} {} -> {} ({:+.0})", r.word, r.baseline_score, r.current_score, r.delta);
                }
            }

            if !report.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &report.improvements {
                    println!("  {} {} -> {} ({:+.0})", i.word, i.baseline_score, i.current_score, i.delta);
                }
            }

            if report.new_words > 0 {
                println!("\n{} new word(s)", report.new_words);
            }
            if report.removed_words > 0 {
                println!("{} removed word(s)", report.removed_words);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}

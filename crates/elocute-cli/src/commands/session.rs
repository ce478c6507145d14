//! The `elocute session` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use uuid::Uuid;

use elocute_core::engine::{SessionEngine, SessionRequest};
use elocute_core::report::SessionReport;
use elocute_providers::{create_evaluator, create_recognizer, load_config_from};
use elocute_report::write_html_report;
use elocute_store::JsonFileStore;

pub struct SessionArgs {
    pub user: String,
    pub level: Option<String>,
    pub material: Option<String>,
    pub reference: Option<String>,
    pub transcript: Option<String>,
    pub audio: Option<PathBuf>,
    pub duration: Option<f64>,
    pub incomplete: bool,
    pub store: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: String,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: SessionArgs) -> Result<()> {
    if let Some(d) = args.duration {
        anyhow::ensure!(d.is_finite() && d > 0.0, "--duration must be positive");
    }
    let config = load_config_from(args.config.as_deref())?;
    let catalog_path = args.catalog.unwrap_or_else(|| config.catalog.clone());
    let catalog = super::load_catalog_if_present(&catalog_path)?;

    let (reference_text, material_level) = match (&args.material, args.reference) {
        (Some(id), _) => {
            let material = catalog
                .as_ref()
                .and_then(|c| c.material(id))
                .with_context(|| format!("material '{id}' not found in {}", catalog_path.display()))?;
            (material.content.clone(), Some(material.level.clone()))
        }
        (None, Some(reference)) => (reference, None),
        (None, None) => anyhow::bail!("pass --material or --reference"),
    };
    let level = args
        .level
        .or(material_level)
        .context("--level is required with --reference")?;

    let audio = args
        .audio
        .as_deref()
        .map(|p| super::read_audio(p, &config.locale))
        .transpose()?;

    let request = SessionRequest {
        session_id: Uuid::new_v4(),
        user: args.user,
        level,
        material_id: args.material,
        reference_text,
        transcript: args.transcript,
        audio,
        duration_secs: args.duration,
        completed: !args.incomplete,
    };

    let store_path = args.store.unwrap_or_else(|| config.store_path.clone());
    let store = Arc::new(JsonFileStore::open(store_path));
    let badges = catalog.map(|c| c.badges).unwrap_or_default();

    let mut engine = SessionEngine::new(
        Arc::new(create_evaluator(&config)),
        store,
        badges,
        config.engine_config(),
    );
    if let Some(recognizer) = create_recognizer(&config.recognizer)? {
        engine = engine.with_recognizer(recognizer);
    }

    let report = engine.complete_session(&request).await?;
    print_report(&report);

    let output = args.output.unwrap_or_else(|| config.output_dir.clone());
    let formats: Vec<&str> = match args.format.as_str() {
        "all" => vec!["json", "html"],
        "none" => vec![],
        other => other.split(',').map(str::trim).collect(),
    };
    for fmt in formats {
        match fmt {
            "json" => {
                let path = output.join(format!("session-{}.json", report.id));
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("session-{}.html", report.id));
                write_html_report(&report, &path)?;
                eprintln!("Feedback page: {}", path.display());
            }
            _ => eprintln!("Unknown format: {fmt}"),
        }
    }

    Ok(())
}

fn print_report(report: &SessionReport) {
    let mut table = Table::new();
    table.set_header(vec!["Pronunciation", "Fluency", "WPM", "Scored by"]);
    table.add_row(vec![
        Cell::new(report.pronunciation.overall_score),
        Cell::new(report.fluency.rounded_score()),
        Cell::new(format!("{:.1}", report.fluency.wpm)),
        Cell::new(report.pronunciation.stage),
    ]);
    println!("{table}");

    if !report.mispronounced_words.is_empty() {
        let words: Vec<&str> = report.mispronounced_words.iter().map(|w| w.word.as_str()).collect();
        println!("Practise: {}", words.join(", "));
    }
    match &report.progress {
        Some(p) => println!(
            "Progress at {}: {} reading(s), {} words",
            p.level, p.readings_completed, p.total_words_read
        ),
        None => println!("Session not completed; progress unchanged."),
    }
    for badge in &report.new_badges {
        println!("New badge: {}", badge.badge_name);
    }
}

//! The `elocute evaluate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table};

use elocute_core::model::{PronunciationResult, WordScore};
use elocute_core::text;
use elocute_providers::{create_evaluator, create_recognizer, load_config_from};

pub async fn execute(
    reference: String,
    spoken: Option<String>,
    audio: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let transcript = match (&spoken, &audio) {
        (Some(spoken), _) => spoken.clone(),
        (None, Some(path)) => {
            let recognizer = create_recognizer(&config.recognizer)?.context(
                "no recognizer configured; set [recognizer] in elocute.toml or pass --spoken",
            )?;
            let input = super::read_audio(path, &config.locale)?;
            match recognizer.transcribe(&input).await {
                Ok(transcript) => transcript,
                Err(e) => {
                    tracing::warn!("recognition failed, scoring as no speech: {e}");
                    String::new()
                }
            }
        }
        (None, None) => String::new(),
    };

    let evaluator = create_evaluator(&config);
    // Audio the recognizer could not turn into speech scores as silence.
    let audio_heard = audio.is_some() && !text::is_no_speech(&transcript);
    let result = evaluator.evaluate(&reference, &transcript, audio_heard)?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => print_result(&result, config.scoring.mispronounced_below),
    }
    Ok(())
}

fn score_color(score: u32, threshold: u32) -> Color {
    if score >= 85 {
        Color::Green
    } else if score >= threshold {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn phonemes_cell(word: &WordScore) -> (String, String) {
    let Some(analysis) = &word.phonemes else {
        return ("-".into(), "-".into());
    };
    let expected = analysis
        .reference_phonemes
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if analysis.problem_phonemes.contains(&i) {
                format!("[{p}]")
            } else {
                p.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    (expected, analysis.spoken_phonemes.join(" "))
}

fn print_result(result: &PronunciationResult, threshold: u32) {
    println!("Overall: {} (scored by {})", result.overall_score, result.stage);
    if !result.recognized_text.is_empty() {
        println!("Heard: {}", result.recognized_text);
    }

    let mut table = Table::new();
    table.set_header(vec!["Word", "Score", "Expected", "Heard"]);
    for word in &result.word_scores {
        let (expected, heard) = phonemes_cell(word);
        table.add_row(vec![
            Cell::new(&word.word),
            Cell::new(word.score).fg(score_color(word.score, threshold)),
            Cell::new(expected),
            Cell::new(heard),
        ]);
    }
    println!("{table}");

    let weak = result.mispronounced_words(threshold);
    if !weak.is_empty() {
        let words: Vec<&str> = weak.iter().map(|w| w.word.as_str()).collect();
        println!("Practise: {}", words.join(", "));
    }
}

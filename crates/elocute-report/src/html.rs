//! HTML feedback page for one reading session.
//!
//! Produces a self-contained HTML file with all CSS inlined: the reference
//! text with every word coloured by its score, the fluency summary, a bar
//! chart of word scores and the problem phonemes of each weak word.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use elocute_core::model::{PhonemeAnalysis, WordScore};
use elocute_core::report::SessionReport;

/// Words at or above this score are shown as good.
const GOOD_SCORE: u32 = 85;
/// Words below this score are shown as poor.
const FAIR_SCORE: u32 = 70;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn score_class(score: u32) -> &'static str {
    if score >= GOOD_SCORE {
        "good"
    } else if score >= FAIR_SCORE {
        "fair"
    } else {
        "poor"
    }
}

fn score_color(score: u32) -> &'static str {
    match score_class(score) {
        "good" => "#22c55e",
        "fair" => "#eab308",
        _ => "#ef4444",
    }
}

/// Generate the feedback page for a session.
pub fn generate_html(report: &SessionReport) -> String {
    let mut html = String::new();
    let result = &report.pronunciation;

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(
        html,
        "<title>Reading feedback: {}</title>",
        html_escape(&report.user)
    );
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Reading feedback</h1>\n");
    let _ = writeln!(
        html,
        "<p class=\"meta\">Reader: <strong>{}</strong> | Level: {} | {}</p>",
        html_escape(&report.user),
        html_escape(&report.level),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    html.push_str("</header>\n");

    // Scores
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Pronunciation</th><th>Fluency</th><th>Words per minute</th><th>Duration</th><th>Scored by</th></tr></thead>\n");
    let _ = writeln!(
        html,
        "<tbody><tr><td class=\"{}\">{}</td><td>{}</td><td>{:.1}</td><td>{:.0}s</td><td>{}</td></tr></tbody></table>",
        score_class(result.overall_score),
        result.overall_score,
        report.fluency.rounded_score(),
        report.fluency.wpm,
        report.duration_secs,
        result.stage,
    );
    html.push_str("</section>\n");

    // Reference text, word by word
    html.push_str("<section class=\"reading\">\n");
    html.push_str("<h2>Your reading</h2>\n<p class=\"words\">");
    for word in &result.word_scores {
        let _ = write!(
            html,
            "<span class=\"word {}\" title=\"{}\">{}</span> ",
            score_class(word.score),
            word.score,
            html_escape(&word.word)
        );
    }
    html.push_str("</p>\n");
    if !result.recognized_text.is_empty() {
        let _ = writeln!(
            html,
            "<p class=\"meta\">We heard: <em>{}</em></p>",
            html_escape(&result.recognized_text)
        );
    }
    html.push_str("</section>\n");

    if !result.word_scores.is_empty() {
        html.push_str("<section class=\"chart\">\n<h2>Word scores</h2>\n");
        html.push_str(&generate_bar_chart(&result.word_scores));
        html.push_str("</section>\n");
    }

    // Words to practise
    if !report.mispronounced_words.is_empty() {
        html.push_str("<section class=\"practice\">\n<h2>Words to practise</h2>\n");
        html.push_str("<table>\n<thead><tr><th>Word</th><th>Heard</th><th>Score</th><th>Expected sounds</th><th>Sounds heard</th></tr></thead>\n<tbody>\n");
        for word in &report.mispronounced_words {
            let (expected, sounds) = word
                .phonemes
                .as_ref()
                .map(|p| (render_expected(p), html_escape(&p.spoken_phonemes.join(" "))))
                .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
            let heard = word.heard.as_deref().map_or_else(|| "-".to_string(), html_escape);
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td class=\"ipa\">{}</td><td class=\"ipa\">{}</td></tr>",
                html_escape(&word.word),
                heard,
                score_class(word.score),
                word.score,
                expected,
                sounds
            );
        }
        html.push_str("</tbody></table>\n</section>\n");
    }

    if !report.new_badges.is_empty() {
        html.push_str("<section class=\"badges\">\n<h2>New badges</h2>\n<ul>\n");
        for badge in &report.new_badges {
            let _ = writeln!(html, "<li>{}</li>", html_escape(&badge.badge_name));
        }
        html.push_str("</ul>\n</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Reference phonemes with the problem ones highlighted.
fn render_expected(analysis: &PhonemeAnalysis) -> String {
    analysis
        .reference_phonemes
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if analysis.problem_phonemes.contains(&i) {
                format!("<mark>{}</mark>", html_escape(p))
            } else {
                html_escape(p)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write the feedback page for a session to a file.
pub fn write_html_report(report: &SessionReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn generate_bar_chart(words: &[WordScore]) -> String {
    let bar_height = 22;
    let max_width = 400;
    let padding = 6;
    let label_width = 160;

    let total_height = words.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, word) in words.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = word.score.min(100) as usize * max_width / 100;

        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&word.word)
        );
        let _ = writeln!(
            svg,
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>",
            label_width,
            y,
            width,
            bar_height,
            score_color(word.score)
        );
        let _ = writeln!(
            svg,
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}</text>",
            label_width + width + 8,
            y + bar_height / 2,
            word.score
        );
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --good: #dcfce7; --fair: #fef9c3; --poor: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --good: #064e3b; --fair: #713f12; --poor: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.words { font-size: 1.4rem; line-height: 2.2; }
.word { padding: 0.1rem 0.3rem; border-radius: 4px; }
.good { background: var(--good); }
.fair { background: var(--fair); }
.poor { background: var(--poor); }
.ipa { font-family: 'Doulos SIL', 'Charis SIL', serif; }
mark { background: var(--poor); color: inherit; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use elocute_core::model::{
        AwardedBadge, EditOp, FluencyResult, PhonemeAlignment, PronunciationResult, ScoringStage,
    };

    fn alignment(i: usize, op: EditOp, score: f64) -> PhonemeAlignment {
        PhonemeAlignment {
            reference_index: i,
            op,
            score,
            is_problem: score < 70.0,
        }
    }

    fn make_test_report() -> SessionReport {
        let analysis = PhonemeAnalysis {
            reference_phonemes: vec!["θ".into(), "ɪ".into(), "ŋ".into(), "k".into()],
            spoken_phonemes: vec!["t".into(), "ɪ".into(), "ŋ".into(), "k".into()],
            alignments: vec![
                alignment(0, EditOp::Replace, 40.0),
                alignment(1, EditOp::Equal, 100.0),
                alignment(2, EditOp::Equal, 100.0),
                alignment(3, EditOp::Equal, 100.0),
            ],
            problem_phonemes: vec![0],
            inserted: vec![],
            score: 60,
            degraded: false,
        };
        let think = WordScore {
            word: "think".into(),
            score: 60,
            heard: Some("tink".into()),
            phonemes: Some(analysis),
        };
        SessionReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            user: "ana".into(),
            level: "beginner".into(),
            material_id: Some("think-tank".into()),
            reference_text: "I think so".into(),
            pronunciation: PronunciationResult {
                overall_score: 87,
                word_scores: vec![
                    WordScore {
                        word: "i".into(),
                        score: 100,
                        heard: Some("i".into()),
                        phonemes: None,
                    },
                    think.clone(),
                    WordScore {
                        word: "so".into(),
                        score: 100,
                        heard: Some("so".into()),
                        phonemes: None,
                    },
                ],
                recognized_text: "I tink so".into(),
                stage: ScoringStage::Phoneme,
            },
            fluency: FluencyResult {
                wpm: 120.0,
                fluency_score: 100.0,
            },
            duration_secs: 1.5,
            mispronounced_words: vec![think],
            progress: None,
            new_badges: vec![AwardedBadge {
                user: "ana".into(),
                badge_id: "first".into(),
                badge_name: "First <Steps>".into(),
                date_earned: chrono::Utc::now(),
            }],
        }
    }

    #[test]
    fn page_contains_scores_and_words() {
        let html = generate_html(&make_test_report());

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("<span class=\"word poor\" title=\"60\">think</span>"));
        assert!(html.contains("<span class=\"word good\" title=\"100\">so</span>"));
        assert!(html.contains("We heard: <em>I tink so</em>"));
        assert!(html.contains("<td class=\"good\">87</td>"));
    }

    #[test]
    fn problem_phonemes_are_marked() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("Words to practise"));
        assert!(html.contains("<mark>θ</mark> ɪ ŋ k"));
        assert!(html.contains("t ɪ ŋ k"));
    }

    #[test]
    fn practice_rows_show_what_was_heard() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("<tr><td>think</td><td>tink</td><td class=\"poor\">60</td>"));

        let mut report = make_test_report();
        report.mispronounced_words[0].heard = None;
        let html = generate_html(&report);
        assert!(html.contains("<tr><td>think</td><td>-</td>"));
    }

    #[test]
    fn user_text_is_escaped() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("First &lt;Steps&gt;"));
        assert!(!html.contains("First <Steps>"));
    }

    #[test]
    fn clean_reading_has_no_practice_section() {
        let mut report = make_test_report();
        report.mispronounced_words.clear();
        report.new_badges.clear();
        let html = generate_html(&report);
        assert!(!html.contains("Words to practise"));
        assert!(!html.contains("New badges"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feedback").join("session.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}

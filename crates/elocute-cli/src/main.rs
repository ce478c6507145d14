//! elocute CLI: reading pronunciation and fluency feedback.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "elocute", version, about = "Pronunciation and fluency scoring for reading practice")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and reading catalog
    Init,

    /// Score one reading of a text
    Evaluate {
        /// The text that should have been read
        #[arg(long)]
        reference: String,

        /// What was actually heard
        #[arg(long, conflicts_with = "audio")]
        spoken: Option<String>,

        /// Audio file to transcribe with the configured recognizer
        #[arg(long)]
        audio: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Compute reading speed and fluency score
    Fluency {
        /// Number of words read
        #[arg(long, conflicts_with = "transcript", required_unless_present = "transcript")]
        words: Option<usize>,

        /// Transcript to count words from
        #[arg(long)]
        transcript: Option<String>,

        /// Reading time in seconds
        #[arg(long)]
        seconds: f64,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Record a reading session: score it, update progress, award badges
    Session {
        /// Learner id
        #[arg(long)]
        user: String,

        /// Reading level (defaults to the material's level)
        #[arg(long)]
        level: Option<String>,

        /// Catalog material that was read
        #[arg(long, conflicts_with = "reference", required_unless_present = "reference")]
        material: Option<String>,

        /// Text that was read, when not from the catalog
        #[arg(long)]
        reference: Option<String>,

        /// What was actually heard
        #[arg(long, conflicts_with = "audio")]
        transcript: Option<String>,

        /// Audio file to transcribe with the configured recognizer
        #[arg(long)]
        audio: Option<PathBuf>,

        /// Reading time in seconds (default: 60)
        #[arg(long)]
        duration: Option<f64>,

        /// The reading was abandoned; do not count it towards progress
        #[arg(long)]
        incomplete: bool,

        /// Progress store file
        #[arg(long)]
        store: Option<PathBuf>,

        /// Catalog file or directory
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output directory for session reports
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report formats: json, html, all, none
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Show learner or class progress
    Progress {
        /// Learner id; omit for the whole class
        #[arg(long)]
        user: Option<String>,

        /// Progress store file
        #[arg(long)]
        store: Option<PathBuf>,

        /// Catalog file or directory, for level placement
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Compare two session reports of the same text
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Score change (in points) that counts as a regression or improvement
        #[arg(long, default_value = "5")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate a reading catalog and the configuration
    Validate {
        /// Catalog file or directory
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "elocute=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Evaluate {
            reference,
            spoken,
            audio,
            format,
        } => commands::evaluate::execute(reference, spoken, audio, format, config).await,
        Commands::Fluency {
            words,
            transcript,
            seconds,
            format,
        } => commands::fluency::execute(words, transcript, seconds, format, config),
        Commands::Session {
            user,
            level,
            material,
            reference,
            transcript,
            audio,
            duration,
            incomplete,
            store,
            catalog,
            output,
            format,
        } => {
            commands::session::execute(commands::session::SessionArgs {
                user,
                level,
                material,
                reference,
                transcript,
                audio,
                duration,
                incomplete,
                store,
                catalog,
                output,
                format,
                config,
            })
            .await
        }
        Commands::Progress {
            user,
            store,
            catalog,
            format,
        } => commands::progress::execute(user, store, catalog, format, config).await,
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { catalog } => commands::validate::execute(catalog, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

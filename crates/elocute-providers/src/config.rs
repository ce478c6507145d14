//! Elocute configuration and factories.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use elocute_core::engine::SessionEngineConfig;
use elocute_core::fluency::FluencyThresholds;
use elocute_core::scoring::{PronunciationEvaluator, ScoringConfig};
use elocute_core::traits::SpeechRecognizer;

use crate::distance::FeatureDistance;
use crate::g2p::RuleBasedG2p;
use crate::recognizer::HttpRecognizer;

/// Which speech recognizer to use.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecognizerConfig {
    Http {
        endpoint: String,
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    /// Transcripts must be supplied by the caller.
    #[default]
    None,
}

impl std::fmt::Debug for RecognizerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognizerConfig::Http {
                endpoint,
                api_key,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("endpoint", endpoint)
                .field("api_key", &api_key.as_ref().map(|_| "***"))
                .field("timeout_secs", timeout_secs)
                .finish(),
            RecognizerConfig::None => f.write_str("None"),
        }
    }
}

/// Top-level elocute configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElocuteConfig {
    /// Locale used for phoneme conversion and recognition.
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub recognizer: RecognizerConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub fluency: FluencyThresholds,
    /// Progress store file.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Catalog file or directory.
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,
    /// Max concurrent sessions in a batch.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Retries after a progress write conflict.
    #[serde(default = "default_conflict_retries")]
    pub max_conflict_retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Where session reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_locale() -> String {
    "en-US".to_string()
}
fn default_store_path() -> PathBuf {
    PathBuf::from("./elocute-data/progress.json")
}
fn default_catalog() -> PathBuf {
    PathBuf::from("./catalogs")
}
fn default_parallelism() -> usize {
    4
}
fn default_conflict_retries() -> u32 {
    5
}
fn default_retry_delay() -> u64 {
    50
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./elocute-results")
}

impl Default for ElocuteConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            recognizer: RecognizerConfig::default(),
            scoring: ScoringConfig::default(),
            fluency: FluencyThresholds::default(),
            store_path: default_store_path(),
            catalog: default_catalog(),
            parallelism: default_parallelism(),
            max_conflict_retries: default_conflict_retries(),
            retry_delay_ms: default_retry_delay(),
            output_dir: default_output_dir(),
        }
    }
}

impl ElocuteConfig {
    /// Problems that would make scoring meaningless.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = self.scoring.validate();
        problems.extend(self.fluency.validate());
        if self.parallelism == 0 {
            problems.push("parallelism must be at least 1".to_string());
        }
        if let RecognizerConfig::Http { endpoint, .. } = &self.recognizer {
            if endpoint.trim().is_empty() {
                problems.push("recognizer endpoint is empty".to_string());
            }
        }
        problems
    }

    pub fn engine_config(&self) -> SessionEngineConfig {
        SessionEngineConfig {
            parallelism: self.parallelism.max(1),
            max_conflict_retries: self.max_conflict_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            fluency: self.fluency,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + end]).unwrap_or_default();
        result.replace_range(start..start + end + 1, &value);
    }
    result
}

fn resolve_recognizer_config(config: &RecognizerConfig) -> RecognizerConfig {
    match config {
        RecognizerConfig::Http {
            endpoint,
            api_key,
            timeout_secs,
        } => RecognizerConfig::Http {
            endpoint: resolve_env_vars(endpoint),
            api_key: api_key.as_deref().map(resolve_env_vars),
            timeout_secs: *timeout_secs,
        },
        RecognizerConfig::None => RecognizerConfig::None,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `elocute.toml` in the current directory
/// 2. `~/.config/elocute/config.toml`
///
/// `ELOCUTE_RECOGNIZER_KEY` overrides the HTTP recognizer's API key.
pub fn load_config() -> Result<ElocuteConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ElocuteConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("elocute.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path().map(|d| d.join("config.toml")).filter(|p| p.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => parse_config_file(&path)?,
        None => ElocuteConfig::default(),
    };

    if let Ok(key) = std::env::var("ELOCUTE_RECOGNIZER_KEY") {
        if let RecognizerConfig::Http { api_key, .. } = &mut config.recognizer {
            *api_key = Some(key);
        }
    }
    config.recognizer = resolve_recognizer_config(&config.recognizer);

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<ElocuteConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    toml::from_str(&content).with_context(|| format!("failed to parse config: {}", path.display()))
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("elocute"))
}

/// Create the configured recognizer, if any.
pub fn create_recognizer(config: &RecognizerConfig) -> Result<Option<Arc<dyn SpeechRecognizer>>> {
    match config {
        RecognizerConfig::Http {
            endpoint,
            api_key,
            timeout_secs,
        } => {
            let recognizer = HttpRecognizer::new(endpoint, api_key.clone(), *timeout_secs)
                .context("failed to create HTTP recognizer")?;
            Ok(Some(Arc::new(recognizer)))
        }
        RecognizerConfig::None => Ok(None),
    }
}

/// Build the standard evaluator: rule-based G2P and feature distance.
pub fn create_evaluator(config: &ElocuteConfig) -> PronunciationEvaluator {
    PronunciationEvaluator::standard(
        Arc::new(RuleBasedG2p::new()),
        Arc::new(FeatureDistance::new()),
        config.locale.clone(),
        config.scoring.clone(),
    )
}

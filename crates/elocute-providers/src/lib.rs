//! elocute-providers: phonetic backends and speech recognition.
//!
//! Implements the `G2p`, `PhoneticDistance` and `SpeechRecognizer` traits
//! from `elocute-core`, and loads the `elocute.toml` configuration that
//! wires them together.

pub mod config;
pub mod distance;
pub mod error;
pub mod g2p;
pub mod mock;
pub mod recognizer;

pub use config::{
    create_evaluator, create_recognizer, load_config, load_config_from, ElocuteConfig,
    RecognizerConfig,
};
pub use distance::FeatureDistance;
pub use error::ProviderError;
pub use g2p::RuleBasedG2p;
pub use recognizer::HttpRecognizer;

//! elocute-core: Scoring, alignment and progress-tracking engine.
//!
//! This crate defines the data model, collaborator traits and the pure
//! scoring logic that the rest of elocute builds on, plus the async
//! session engine that ties them to a recognizer and a progress store.

pub mod badges;
pub mod engine;
pub mod error;
pub mod fluency;
pub mod matcher;
pub mod model;
pub mod parser;
pub mod phonemes;
pub mod progress;
pub mod report;
pub mod scoring;
pub mod statistics;
pub mod text;
pub mod traits;
pub mod words;

//! Subcommand implementations.

pub mod compare;
pub mod evaluate;
pub mod fluency;
pub mod init;
pub mod progress;
pub mod session;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use elocute_core::model::Catalog;
use elocute_core::parser;
use elocute_core::traits::AudioInput;

/// MIME type of an audio file, from its extension.
pub fn audio_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg" | "oga") => "audio/ogg",
        Some("webm") => "audio/webm",
        Some("flac") => "audio/flac",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}

pub fn read_audio(path: &Path, locale: &str) -> Result<AudioInput> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read audio file: {}", path.display()))?;
    Ok(AudioInput {
        bytes,
        mime_type: audio_mime_type(path).to_string(),
        locale: locale.to_string(),
    })
}

/// Load the catalog at `path`, or `None` with a warning if there is none.
pub fn load_catalog_if_present(path: &Path) -> Result<Option<Catalog>> {
    if !path.exists() {
        tracing::warn!("no catalog at {}; badges and placement are disabled", path.display());
        return Ok(None);
    }
    parser::load_catalog(path).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_types_from_extension() {
        assert_eq!(audio_mime_type(Path::new("a.WAV")), "audio/wav");
        assert_eq!(audio_mime_type(Path::new("dir/b.mp3")), "audio/mpeg");
        assert_eq!(audio_mime_type(Path::new("noext")), "application/octet-stream");
    }
}

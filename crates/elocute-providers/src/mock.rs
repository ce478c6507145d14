//! Mock recognizer for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use elocute_core::error::RecognitionError;
use elocute_core::traits::{AudioInput, SpeechRecognizer};

/// A recognizer that returns a scripted transcript without any audio processing.
pub struct MockRecognizer {
    /// `None` means every call fails as unavailable.
    transcript: Option<String>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last audio received.
    last_audio: Mutex<Option<AudioInput>>,
}

impl MockRecognizer {
    /// Create a mock that always hears `transcript`.
    pub fn with_transcript(transcript: &str) -> Self {
        Self {
            transcript: Some(transcript.to_string()),
            call_count: AtomicU32::new(0),
            last_audio: Mutex::new(None),
        }
    }

    /// Create a mock whose service is always down.
    pub fn unavailable() -> Self {
        Self {
            transcript: None,
            call_count: AtomicU32::new(0),
            last_audio: Mutex::new(None),
        }
    }

    /// Get the number of calls made to this recognizer.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last audio passed to this recognizer.
    pub fn last_audio(&self) -> Option<AudioInput> {
        self.last_audio
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcribe(&self, audio: &AudioInput) -> Result<String, RecognitionError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_audio.lock().unwrap_or_else(|e| e.into_inner()) = Some(audio.clone());

        match &self.transcript {
            Some(t) if t.trim().is_empty() => Err(RecognitionError::NoSpeech),
            Some(t) => Ok(t.clone()),
            None => Err(RecognitionError::Unavailable("mock recognizer is offline".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio() -> AudioInput {
        AudioInput {
            bytes: vec![1, 2, 3],
            mime_type: "audio/wav".into(),
            locale: "en-US".into(),
        }
    }

    #[tokio::test]
    async fn returns_transcript_and_counts_calls() {
        let mock = MockRecognizer::with_transcript("the cat sat");
        assert_eq!(mock.transcribe(&audio()).await.unwrap(), "the cat sat");
        assert_eq!(mock.transcribe(&audio()).await.unwrap(), "the cat sat");
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.last_audio().unwrap().bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn blank_transcript_is_no_speech() {
        let mock = MockRecognizer::with_transcript("  ");
        assert!(matches!(
            mock.transcribe(&audio()).await,
            Err(RecognitionError::NoSpeech)
        ));
    }

    #[tokio::test]
    async fn unavailable_mock_fails() {
        let mock = MockRecognizer::unavailable();
        assert!(matches!(
            mock.transcribe(&audio()).await,
            Err(RecognitionError::Unavailable(_))
        ));
        assert_eq!(mock.call_count(), 1);
    }
}

//! Session engine orchestrator.
//!
//! Turns one reading session into a [`SessionReport`]: recovers the
//! transcript, scores pronunciation and fluency, folds the session into the
//! learner's stored progress and records any newly earned badges. Batches
//! of sessions run concurrently under a semaphore.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::badges::{evaluate_badges, ProgressFacts};
use crate::error::StoreError;
use crate::fluency::{compute_fluency_with, FluencyThresholds};
use crate::model::{AwardedBadge, Badge, ProgressKey, ProgressRecord, SessionFacts};
use crate::progress::update_progress;
use crate::report::SessionReport;
use crate::scoring::PronunciationEvaluator;
use crate::text;
use crate::traits::{AudioInput, ProgressStore, SpeechRecognizer};

/// Duration assumed when a session does not report one.
pub const DEFAULT_SESSION_SECS: f64 = 60.0;

/// Configuration for the session engine.
#[derive(Debug, Clone)]
pub struct SessionEngineConfig {
    /// Maximum concurrent sessions in a batch.
    pub parallelism: usize,
    /// Reload-and-retry attempts after a progress write conflict.
    pub max_conflict_retries: u32,
    /// Delay before the first retry; doubles on each further one.
    pub retry_delay: Duration,
    pub fluency: FluencyThresholds,
}

impl Default for SessionEngineConfig {
    fn default() -> Self {
        Self {
            parallelism: 4,
            max_conflict_retries: 5,
            retry_delay: Duration::from_millis(50),
            fluency: FluencyThresholds::default(),
        }
    }
}

/// One reading session to evaluate.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub session_id: Uuid,
    pub user: String,
    pub level: String,
    pub material_id: Option<String>,
    pub reference_text: String,
    /// Transcript recovered by the client, if any.
    pub transcript: Option<String>,
    /// Raw audio, used when no transcript was supplied.
    pub audio: Option<AudioInput>,
    pub duration_secs: Option<f64>,
    /// Only completed sessions count towards progress.
    pub completed: bool,
}

impl SessionRequest {
    /// A completed session with a transcript and a fresh id.
    pub fn new(
        user: impl Into<String>,
        level: impl Into<String>,
        reference_text: impl Into<String>,
        transcript: impl Into<String>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user: user.into(),
            level: level.into(),
            material_id: None,
            reference_text: reference_text.into(),
            transcript: Some(transcript.into()),
            audio: None,
            duration_secs: None,
            completed: true,
        }
    }
}

/// Progress reporting trait for batches.
pub trait SessionReporter: Send + Sync {
    fn on_session_start(&self, session_id: Uuid, user: &str);
    fn on_session_complete(&self, report: &SessionReport);
    fn on_session_error(&self, session_id: Uuid, user: &str, error: &str);
    fn on_batch_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op session reporter.
pub struct NoopReporter;

impl SessionReporter for NoopReporter {
    fn on_session_start(&self, _: Uuid, _: &str) {}
    fn on_session_complete(&self, _: &SessionReport) {}
    fn on_session_error(&self, _: Uuid, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Outcome of [`SessionEngine::run_batch`].
#[derive(Debug)]
pub struct BatchSummary {
    pub reports: Vec<SessionReport>,
    /// Session id and error message of each failed session.
    pub failures: Vec<(Uuid, String)>,
    pub duration_ms: u64,
}

/// Orchestrates scoring, progress and badges for reading sessions.
pub struct SessionEngine {
    evaluator: Arc<PronunciationEvaluator>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    store: Arc<dyn ProgressStore>,
    badges: Vec<Badge>,
    config: SessionEngineConfig,
}

impl SessionEngine {
    pub fn new(
        evaluator: Arc<PronunciationEvaluator>,
        store: Arc<dyn ProgressStore>,
        badges: Vec<Badge>,
        config: SessionEngineConfig,
    ) -> Self {
        Self {
            evaluator,
            recognizer: None,
            store,
            badges,
            config,
        }
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// The transcript to score: the supplied one, else the recognizer's.
    ///
    /// Recognition failures are logged and come back empty.
    async fn recover_transcript(&self, request: &SessionRequest) -> String {
        if let Some(transcript) = &request.transcript {
            if !text::is_no_speech(transcript) {
                return transcript.clone();
            }
        }
        let (Some(audio), Some(recognizer)) = (&request.audio, &self.recognizer) else {
            return String::new();
        };
        match recognizer.transcribe(audio).await {
            Ok(transcript) => {
                debug!(recognizer = recognizer.name(), "transcribed {} bytes", audio.bytes.len());
                transcript
            }
            Err(e) => {
                warn!(recognizer = recognizer.name(), "recognition failed, scoring as no speech: {e}");
                String::new()
            }
        }
    }

    /// Evaluate one session and record its effect on progress and badges.
    #[tracing::instrument(skip(self, request), fields(session = %request.session_id, user = %request.user))]
    pub async fn complete_session(&self, request: &SessionRequest) -> Result<SessionReport> {
        let transcript = self.recover_transcript(request).await;
        // Audio that yielded no speech (outage, timeout, silence) gets the
        // flat no-speech score rather than zeros.
        let audio_heard = request.audio.is_some() && !text::is_no_speech(&transcript);
        let pronunciation = self
            .evaluator
            .evaluate(&request.reference_text, &transcript, audio_heard)
            .with_context(|| format!("failed to evaluate session {}", request.session_id))?;

        let duration_secs = request.duration_secs.unwrap_or(DEFAULT_SESSION_SECS);
        let spoken_words = if text::is_no_speech(&transcript) {
            0
        } else {
            text::word_count(&transcript)
        };
        let fluency = compute_fluency_with(&self.config.fluency, spoken_words, duration_secs);

        let threshold = self.evaluator.context().config.mispronounced_below;
        let mispronounced_words = pronunciation
            .mispronounced_words(threshold)
            .into_iter()
            .cloned()
            .collect();

        let now = Utc::now();
        let (progress, new_badges) = if request.completed {
            let facts = SessionFacts {
                session_id: request.session_id,
                completed: true,
                word_count: text::word_count(&request.reference_text) as u64,
                wpm: fluency.wpm,
                accuracy: f64::from(pronunciation.overall_score),
                completed_at: now,
            };
            let key = ProgressKey::new(request.user.clone(), request.level.clone());
            let progress = self.apply_progress(&key, &facts).await?;
            let badges = self.award_badges(&request.user).await?;
            (Some(progress), badges)
        } else {
            debug!("session not completed, progress unchanged");
            (None, Vec::new())
        };

        info!(
            overall = pronunciation.overall_score,
            stage = %pronunciation.stage,
            wpm = fluency.wpm,
            badges = new_badges.len(),
            "session complete"
        );

        Ok(SessionReport {
            id: request.session_id,
            created_at: now,
            user: request.user.clone(),
            level: request.level.clone(),
            material_id: request.material_id.clone(),
            reference_text: request.reference_text.clone(),
            pronunciation,
            fluency,
            duration_secs,
            mispronounced_words,
            progress,
            new_badges,
        })
    }

    /// Fold a session into the stored record with compare-and-swap,
    /// reloading on conflict with exponential backoff.
    async fn apply_progress(&self, key: &ProgressKey, facts: &SessionFacts) -> Result<ProgressRecord> {
        let mut retry_delay = self.config.retry_delay;
        let mut last_conflict = None;

        for retry in 0..=self.config.max_conflict_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(Duration::from_secs(5));
            }
            let existing = self
                .store
                .load_progress(key)
                .await
                .with_context(|| format!("failed to load progress for {key}"))?;
            let updated = update_progress(existing, key, facts);

            match self.store.save_progress(&updated, facts.session_id).await {
                Ok(saved) => return Ok(saved),
                Err(StoreError::AlreadyApplied(id)) => {
                    info!("session {id} already recorded for {key}");
                    let stored = self
                        .store
                        .load_progress(key)
                        .await
                        .with_context(|| format!("failed to load progress for {key}"))?;
                    return Ok(stored.unwrap_or(updated));
                }
                Err(e) if e.is_conflict() => {
                    debug!(retry, "progress write conflict for {key}: {e}");
                    last_conflict = Some(e);
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("failed to save progress for {key}"))
                }
            }
        }

        Err(anyhow::anyhow!(
            "gave up updating progress for {key} after {} retries: {}",
            self.config.max_conflict_retries,
            last_conflict.map(|e| e.to_string()).unwrap_or_default()
        ))
    }

    /// Record every badge the user now qualifies for and did not have.
    async fn award_badges(&self, user: &str) -> Result<Vec<AwardedBadge>> {
        if self.badges.is_empty() {
            return Ok(Vec::new());
        }
        let records = self
            .store
            .list_progress(user)
            .await
            .with_context(|| format!("failed to list progress of {user}"))?;
        let facts = ProgressFacts::from_records(user, &records);
        let already: HashSet<String> = self
            .store
            .awarded_badges(user)
            .await
            .with_context(|| format!("failed to list badges of {user}"))?
            .into_iter()
            .map(|a| a.badge_id)
            .collect();

        let mut awarded = Vec::new();
        for candidate in evaluate_badges(&self.badges, &already, &facts, Utc::now()) {
            // A concurrent session may have recorded it first.
            if self
                .store
                .record_award(&candidate)
                .await
                .with_context(|| format!("failed to record badge {}", candidate.badge_id))?
            {
                info!(badge = %candidate.badge_id, "badge earned by {user}");
                awarded.push(candidate);
            }
        }
        Ok(awarded)
    }

    /// Evaluate many sessions concurrently.
    pub async fn run_batch(
        &self,
        requests: &[SessionRequest],
        reporter: &dyn SessionReporter,
    ) -> BatchSummary {
        let start = Instant::now();
        let semaphore = Semaphore::new(self.config.parallelism.max(1));
        let semaphore = &semaphore;

        let mut futures = FuturesUnordered::new();
        for request in requests {
            futures.push(async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => {
                        reporter.on_session_start(request.session_id, &request.user);
                        self.complete_session(request).await
                    }
                    Err(_) => Err(anyhow::anyhow!("semaphore closed")),
                };
                (request, result)
            });
        }

        let mut reports = Vec::new();
        let mut failures = Vec::new();
        let total = futures.len();

        while let Some((request, result)) = futures.next().await {
            match result {
                Ok(report) => {
                    reporter.on_session_complete(&report);
                    reports.push(report);
                }
                Err(e) => {
                    tracing::error!("session {} for {} failed: {e:#}", request.session_id, request.user);
                    reporter.on_session_error(request.session_id, &request.user, &format!("{e:#}"));
                    failures.push((request.session_id, format!("{e:#}")));
                }
            }
        }

        let elapsed = start.elapsed();
        reporter.on_batch_complete(total, reports.len(), failures.len(), elapsed);

        BatchSummary {
            reports,
            failures,
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}

//! Dictation controller managing speech-to-text sessions.
//!
//! A `DictationController` owns one recognizer and at most one active
//! `DictationSession`. `toggle` starts or stops capture; the recognizer's
//! asynchronous results come back through `handle_event`, which yields the
//! recognized text only if the event belongs to the session still listening.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use voqit_core::error::VoqitError;

use crate::engine::SpeechRecognizer;
use crate::state::DictationState;

/// Tracks one recognition session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictationSession {
    /// Unique identifier, echoed back in every `RecognitionEvent`.
    pub id: Uuid,
    /// When capture started.
    pub start_time: DateTime<Utc>,
    /// BCP-47 language tag for the recognizer.
    pub language: String,
}

impl DictationSession {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time: Utc::now(),
            language: language.into(),
        }
    }

    /// Returns the elapsed duration of this session in seconds.
    pub fn elapsed_secs(&self) -> f32 {
        let elapsed = Utc::now() - self.start_time;
        elapsed.num_milliseconds() as f32 / 1000.0
    }
}

/// What the recognizer reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionOutcome {
    /// Final recognized text.
    Result(String),
    /// The engine failed.
    Error(String),
    /// The engine detected end of speech without a result.
    End,
}

/// A recognizer callback tagged with the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionEvent {
    pub session_id: Uuid,
    pub outcome: RecognitionOutcome,
}

impl RecognitionEvent {
    pub fn result(session_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            session_id,
            outcome: RecognitionOutcome::Result(text.into()),
        }
    }

    pub fn error(session_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            session_id,
            outcome: RecognitionOutcome::Error(message.into()),
        }
    }

    pub fn end(session_id: Uuid) -> Self {
        Self {
            session_id,
            outcome: RecognitionOutcome::End,
        }
    }
}

/// Two-state dictation machine over a platform recognizer.
pub struct DictationController {
    recognizer: Box<dyn SpeechRecognizer>,
    language: String,
    session: Mutex<Option<DictationSession>>,
}

impl std::fmt::Debug for DictationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictationController")
            .field("language", &self.language)
            .field("session", &self.session)
            .finish()
    }
}

impl DictationController {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>, language: impl Into<String>) -> Self {
        Self {
            recognizer,
            language: language.into(),
            session: Mutex::new(None),
        }
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<DictationSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current dictation state.
    pub fn state(&self) -> DictationState {
        if self.lock_session().is_some() {
            DictationState::Listening
        } else {
            DictationState::Idle
        }
    }

    /// Returns a clone of the active session, if listening.
    pub fn current_session(&self) -> Option<DictationSession> {
        self.lock_session().clone()
    }

    /// Start capture when idle, stop it when listening.
    ///
    /// Stopping always lands in `Idle`, even if the recognizer reports an
    /// error while stopping. Starting leaves the controller `Idle` if the
    /// recognizer refuses to start.
    pub fn toggle(&self) -> Result<DictationState, VoqitError> {
        let mut guard = self.lock_session();

        if let Some(session) = guard.take() {
            if let Err(e) = self.recognizer.stop() {
                tracing::warn!(session_id = %session.id, error = %e, "Recognizer stop failed");
            }
            tracing::info!(
                session_id = %session.id,
                elapsed_secs = session.elapsed_secs(),
                "Dictation stopped, partial result discarded"
            );
            tracing::debug!(
                "Dictation state: {} -> {}",
                DictationState::Listening,
                DictationState::Idle
            );
            return Ok(DictationState::Idle);
        }

        let session = DictationSession::new(self.language.clone());
        self.recognizer.start(&session)?;
        tracing::info!(
            session_id = %session.id,
            language = %session.language,
            "Dictation session started"
        );
        tracing::debug!(
            "Dictation state: {} -> {}",
            DictationState::Idle,
            DictationState::Listening
        );
        *guard = Some(session);
        Ok(DictationState::Listening)
    }

    /// Apply a recognizer event.
    ///
    /// Returns the recognized text when a result arrives for the listening
    /// session. Events for any other session (stopped or superseded) are
    /// ignored, which is how a cancelled capture's late result is discarded.
    pub fn handle_event(&self, event: RecognitionEvent) -> Option<String> {
        let mut guard = self.lock_session();

        match guard.as_ref() {
            Some(active) if active.id == event.session_id => {}
            _ => {
                tracing::debug!(session_id = %event.session_id, "Ignoring stale recognition event");
                return None;
            }
        }

        *guard = None;
        tracing::debug!(
            "Dictation state: {} -> {}",
            DictationState::Listening,
            DictationState::Idle
        );

        match event.outcome {
            RecognitionOutcome::Result(text) if !text.trim().is_empty() => {
                tracing::info!(text_len = text.len(), "Dictation recognized");
                Some(text)
            }
            RecognitionOutcome::Result(_) => {
                tracing::debug!("Recognizer returned empty text");
                None
            }
            RecognitionOutcome::Error(message) => {
                tracing::warn!(error = %message, "Speech recognition error");
                None
            }
            RecognitionOutcome::End => {
                tracing::debug!("Recognizer ended without a result");
                None
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

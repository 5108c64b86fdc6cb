//! Narration controller managing text-to-speech playback.
//!
//! At most one utterance plays at a time. `toggle` while speaking always
//! cancels, whatever text is playing; it never queues a second utterance.

use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use voqit_core::error::VoqitError;

use crate::engine::SpeechSynthesizer;
use crate::state::NarrationState;

/// A single piece of text handed to the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub id: Uuid,
    pub text: String,
    pub language: String,
}

impl Utterance {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            language: language.into(),
        }
    }
}

/// How an utterance finished on the synthesizer side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrationOutcome {
    Finished,
    Failed(String),
}

/// A synthesizer callback tagged with the utterance that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationEvent {
    pub utterance_id: Uuid,
    pub outcome: NarrationOutcome,
}

impl NarrationEvent {
    pub fn finished(utterance_id: Uuid) -> Self {
        Self {
            utterance_id,
            outcome: NarrationOutcome::Finished,
        }
    }

    pub fn failed(utterance_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            utterance_id,
            outcome: NarrationOutcome::Failed(message.into()),
        }
    }
}

/// Two-state narration machine over a platform synthesizer.
pub struct NarrationController {
    synthesizer: Box<dyn SpeechSynthesizer>,
    language: String,
    active: Mutex<Option<Utterance>>,
}

impl std::fmt::Debug for NarrationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationController")
            .field("language", &self.language)
            .field("active", &self.active)
            .finish()
    }
}

impl NarrationController {
    pub fn new(synthesizer: Box<dyn SpeechSynthesizer>, language: impl Into<String>) -> Self {
        Self {
            synthesizer,
            language: language.into(),
            active: Mutex::new(None),
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<Utterance>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> NarrationState {
        if self.lock_active().is_some() {
            NarrationState::Speaking
        } else {
            NarrationState::Idle
        }
    }

    /// The utterance currently playing, if any.
    pub fn current_utterance(&self) -> Option<Utterance> {
        self.lock_active().clone()
    }

    /// Speak `text` when idle; cancel playback when speaking.
    pub fn toggle(&self, text: &str) -> Result<NarrationState, VoqitError> {
        let mut guard = self.lock_active();

        if let Some(utterance) = guard.take() {
            if let Err(e) = self.synthesizer.cancel() {
                tracing::warn!(
                    utterance_id = %utterance.id,
                    error = %e,
                    "Synthesizer cancel failed"
                );
            }
            tracing::info!(utterance_id = %utterance.id, "Narration cancelled");
            return Ok(NarrationState::Idle);
        }

        let utterance = Utterance::new(text, self.language.clone());
        self.synthesizer.speak(&utterance)?;
        tracing::info!(
            utterance_id = %utterance.id,
            text_len = utterance.text.len(),
            "Narration started"
        );
        *guard = Some(utterance);
        Ok(NarrationState::Speaking)
    }

    /// Apply a synthesizer end-of-utterance event.
    ///
    /// Events for an utterance that is no longer active are ignored.
    pub fn handle_event(&self, event: NarrationEvent) -> NarrationState {
        let mut guard = self.lock_active();

        let is_current = guard
            .as_ref()
            .is_some_and(|active| active.id == event.utterance_id);
        if !is_current {
            tracing::debug!(utterance_id = %event.utterance_id, "Ignoring stale narration event");
            return if guard.is_some() {
                NarrationState::Speaking
            } else {
                NarrationState::Idle
            };
        }

        *guard = None;
        match event.outcome {
            NarrationOutcome::Finished => {
                tracing::debug!(utterance_id = %event.utterance_id, "Narration finished");
            }
            NarrationOutcome::Failed(message) => {
                tracing::warn!(
                    utterance_id = %event.utterance_id,
                    error = %message,
                    "Narration failed"
                );
            }
        }
        NarrationState::Idle
    }
}

// =============================================================================
// Tests
// =============================================================================

//! In-memory speech engines for tests and headless runs.
//!
//! Both mocks record every call they receive. Clones share the same log, so
//! a test can keep one handle while a controller owns another.

use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;
use voqit_core::error::VoqitError;

use crate::dictation::DictationSession;
use crate::engine::{SpeechRecognizer, SpeechSynthesizer};
use crate::narration::Utterance;

/// A call observed by a mock engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Start(Uuid),
    Stop,
    Speak { id: Uuid, text: String },
    Cancel,
}

#[derive(Debug, Default)]
struct MockLog {
    calls: Vec<MockCall>,
    fail_next: bool,
}

fn record(log: &Mutex<MockLog>, call: MockCall, what: &str) -> Result<(), String> {
    let mut log = log.lock().unwrap_or_else(PoisonError::into_inner);
    if log.fail_next {
        log.fail_next = false;
        return Err(format!("mock {} failed", what));
    }
    log.calls.push(call);
    Ok(())
}

/// Recognizer that never hears anything on its own; tests inject events.
#[derive(Debug, Clone, Default)]
pub struct MockRecognizer {
    log: Arc<Mutex<MockLog>>,
}

impl MockRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `start` or `stop` call fail.
    pub fn fail_next(&self) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).fail_next = true;
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .clone()
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn start(&self, session: &DictationSession) -> Result<(), VoqitError> {
        record(&self.log, MockCall::Start(session.id), "start").map_err(VoqitError::Dictation)
    }

    fn stop(&self) -> Result<(), VoqitError> {
        record(&self.log, MockCall::Stop, "stop").map_err(VoqitError::Dictation)
    }
}

/// Synthesizer that records utterances instead of playing them.
#[derive(Debug, Clone, Default)]
pub struct MockSynthesizer {
    log: Arc<Mutex<MockLog>>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `speak` or `cancel` call fail.
    pub fn fail_next(&self) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).fail_next = true;
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .clone()
    }
}

impl SpeechSynthesizer for MockSynthesizer {
    fn speak(&self, utterance: &Utterance) -> Result<(), VoqitError> {
        record(
            &self.log,
            MockCall::Speak {
                id: utterance.id,
                text: utterance.text.clone(),
            },
            "speak",
        )
        .map_err(VoqitError::Narration)
    }

    fn cancel(&self) -> Result<(), VoqitError> {
        record(&self.log, MockCall::Cancel, "cancel").map_err(VoqitError::Narration)
    }
}

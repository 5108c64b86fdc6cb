//! Chat session: the transcript owner and single entry point for front-ends.
//!
//! Wires the completion client and the two speech controllers together:
//! - `submit` is single-flight; a second call while one is outstanding is a no-op.
//! - every completed submit appends either a question/answer pair or exactly
//!   one failure entry.
//! - dictation and narration are independent of the pipeline and of each other.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use voqit_core::config::MessagesConfig;
use voqit_core::types::{EntryKind, Question, TranscriptEntry};
use voqit_speech::{
    Capability, DictationController, DictationState, NarrationController, NarrationEvent,
    NarrationState, RecognitionEvent,
};

use crate::client::CompletionClient;
use crate::error::{ChatError, CompletionError};

/// What a call to `submit` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A question/answer pair was appended.
    Answered,
    /// One rate-limit entry was appended.
    RateLimited,
    /// One generic failure entry was appended.
    Failed,
    /// Input was blank; nothing happened.
    Blank,
    /// Another submit is in flight; nothing happened.
    Busy,
}

/// Holds the in-flight flag for the lifetime of one submit.
///
/// Released on drop, so an early return, a panic, or a dropped future
/// all leave the session ready for the next submit.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct ChatSession {
    client: CompletionClient,
    messages: MessagesConfig,
    transcript: Mutex<Vec<TranscriptEntry>>,
    pending_input: Mutex<String>,
    in_flight: AtomicBool,
    dictation: Capability<DictationController>,
    narration: Capability<NarrationController>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("client", &self.client)
            .field("transcript_len", &self.lock_transcript().len())
            .field("in_flight", &self.is_generating())
            .field("dictation", &self.dictation.is_available())
            .field("narration", &self.narration.is_available())
            .finish()
    }
}

impl ChatSession {
    /// Create a session with no speech capabilities.
    pub fn new(client: CompletionClient, messages: MessagesConfig) -> Self {
        Self {
            client,
            messages,
            transcript: Mutex::new(Vec::new()),
            pending_input: Mutex::new(String::new()),
            in_flight: AtomicBool::new(false),
            dictation: Capability::Unavailable,
            narration: Capability::Unavailable,
        }
    }

    pub fn with_dictation(mut self, dictation: Capability<DictationController>) -> Self {
        self.dictation = dictation;
        self
    }

    pub fn with_narration(mut self, narration: Capability<NarrationController>) -> Self {
        self.narration = narration;
        self
    }

    fn lock_transcript(&self) -> MutexGuard<'_, Vec<TranscriptEntry>> {
        self.transcript.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_input(&self) -> MutexGuard<'_, String> {
        self.pending_input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // -- Transcript --

    /// Snapshot of the transcript in chronological order.
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.lock_transcript().clone()
    }

    pub fn transcript_len(&self) -> usize {
        self.lock_transcript().len()
    }

    /// Whether a submit is currently waiting on the completion client.
    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn pending_input(&self) -> String {
        self.lock_input().clone()
    }

    pub fn set_pending_input(&self, text: impl Into<String>) {
        *self.lock_input() = text.into();
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    // -- Submit --

    /// Submit whatever is in the pending-input field.
    pub async fn submit_pending(&self) -> SubmitOutcome {
        let input = self.pending_input();
        self.submit(&input).await
    }

    /// Ask `question` and record the exchange in the transcript.
    pub async fn submit(&self, question: &str) -> SubmitOutcome {
        let Some(question) = Question::parse(question) else {
            tracing::debug!("Ignoring blank submit");
            return SubmitOutcome::Blank;
        };

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Ignoring submit while a request is in flight");
            return SubmitOutcome::Busy;
        };

        match self.client.complete(question.as_str()).await {
            Ok(answer) => {
                {
                    let mut transcript = self.lock_transcript();
                    transcript.push(TranscriptEntry::question(question.into_inner()));
                    transcript.push(TranscriptEntry::answer(answer));
                }
                self.lock_input().clear();
                SubmitOutcome::Answered
            }
            Err(CompletionError::RateLimited { attempts }) => {
                tracing::warn!(attempts, "Surfacing rate-limit failure");
                self.lock_transcript().push(TranscriptEntry::failure(
                    self.messages.rate_limited.clone(),
                    EntryKind::RateLimited,
                ));
                SubmitOutcome::RateLimited
            }
            Err(CompletionError::RequestFailed(reason)) => {
                tracing::warn!(error = %reason, "Surfacing request failure");
                self.lock_transcript().push(TranscriptEntry::failure(
                    self.messages.request_failed.clone(),
                    EntryKind::Failed,
                ));
                SubmitOutcome::Failed
            }
            Err(CompletionError::InvalidInput) => SubmitOutcome::Blank,
        }
    }

    // -- Dictation --

    pub fn dictation_available(&self) -> bool {
        self.dictation.is_available()
    }

    pub fn dictation_state(&self) -> DictationState {
        self.dictation
            .as_ref()
            .map(DictationController::state)
            .unwrap_or_default()
    }

    pub fn dictation(&self) -> Option<&DictationController> {
        self.dictation.as_ref()
    }

    pub fn toggle_dictation(&self) -> Result<DictationState, ChatError> {
        let controller = self
            .dictation
            .as_ref()
            .ok_or(ChatError::DictationUnavailable)?;
        Ok(controller.toggle()?)
    }

    /// Feed a recognizer event to the dictation controller.
    ///
    /// Recognized text replaces the pending input and is returned so the
    /// front-end can submit it.
    pub fn handle_recognition(&self, event: RecognitionEvent) -> Option<String> {
        let text = self.dictation.as_ref()?.handle_event(event)?;
        self.set_pending_input(text.clone());
        Some(text)
    }

    // -- Narration --

    pub fn narration_available(&self) -> bool {
        self.narration.is_available()
    }

    pub fn narration_state(&self) -> NarrationState {
        self.narration
            .as_ref()
            .map(NarrationController::state)
            .unwrap_or_default()
    }

    pub fn narration(&self) -> Option<&NarrationController> {
        self.narration.as_ref()
    }

    pub fn toggle_narration(&self, text: &str) -> Result<NarrationState, ChatError> {
        let controller = self
            .narration
            .as_ref()
            .ok_or(ChatError::NarrationUnavailable)?;
        Ok(controller.toggle(text)?)
    }

    pub fn handle_narration(&self, event: NarrationEvent) -> NarrationState {
        self.narration
            .as_ref()
            .map(|controller| controller.handle_event(event))
            .unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Speech engine traits implemented by platform backends.
//!
//! Both traits are fire-and-forget: `start` and `speak` only begin the work.
//! Completion is reported asynchronously by the backend as a
//! [`RecognitionEvent`](crate::RecognitionEvent) or
//! [`NarrationEvent`](crate::NarrationEvent), which the owner feeds back
//! into the matching controller.

use voqit_core::error::VoqitError;

use crate::dictation::DictationSession;
use crate::narration::Utterance;

/// A speech-to-text engine.
pub trait SpeechRecognizer: Send + Sync {
    /// Begin capturing speech for `session`.
    ///
    /// Every event produced for this capture must carry `session.id`.
    fn start(&self, session: &DictationSession) -> Result<(), VoqitError>;

    /// Stop the active capture. Any partial result is discarded.
    fn stop(&self) -> Result<(), VoqitError>;
}

/// A text-to-speech engine.
pub trait SpeechSynthesizer: Send + Sync {
    /// Begin speaking `utterance`.
    fn speak(&self, utterance: &Utterance) -> Result<(), VoqitError>;

    /// Stop playback immediately, dropping any unspoken text.
    fn cancel(&self) -> Result<(), VoqitError>;
}

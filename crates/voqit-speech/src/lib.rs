//! Voqit Speech crate - dictation and narration state machines.
//!
//! Wraps platform speech-to-text and text-to-speech engines behind two small
//! controllers:
//! - `DictationController`: Idle <-> Listening, one recognition session at a time.
//! - `NarrationController`: Idle <-> Speaking, one utterance at a time.
//!
//! Engines are reached through the `SpeechRecognizer` and `SpeechSynthesizer`
//! traits and are detected once at startup as a `Capability`.

pub mod capability;
pub mod dictation;
pub mod engine;
pub mod mock;
pub mod narration;
pub mod state;

pub use capability::Capability;
pub use dictation::{DictationController, DictationSession, RecognitionEvent, RecognitionOutcome};
pub use engine::{SpeechRecognizer, SpeechSynthesizer};
pub use mock::{MockCall, MockRecognizer, MockSynthesizer};
pub use narration::{NarrationController, NarrationEvent, NarrationOutcome, Utterance};
pub use state::{DictationState, NarrationState};

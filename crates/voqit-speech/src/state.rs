//! Modality states for speech input and output.
//!
//! Each axis is a two-state machine:
//! - Dictation: Idle -> Listening (start), Listening -> Idle (result, error, end, stop)
//! - Narration: Idle -> Speaking (speak), Speaking -> Idle (end, cancel)
//!
//! The two axes are independent of each other.

use std::fmt;

/// Operational state of the dictation controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DictationState {
    /// No recognition session. Ready to start.
    #[default]
    Idle,
    /// A recognition session is capturing speech.
    Listening,
}

impl fmt::Display for DictationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictationState::Idle => write!(f, "Idle"),
            DictationState::Listening => write!(f, "Listening"),
        }
    }
}

/// Operational state of the narration controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NarrationState {
    /// Nothing is being spoken.
    #[default]
    Idle,
    /// An utterance is playing.
    Speaking,
}

impl fmt::Display for NarrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NarrationState::Idle => write!(f, "Idle"),
            NarrationState::Speaking => write!(f, "Speaking"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

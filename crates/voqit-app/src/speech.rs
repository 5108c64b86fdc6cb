//! Speech engines backed by external programs.
//!
//! The recognizer runs a program whose first non-empty stdout line is the
//! dictated text. The synthesizer runs a program with the text as its last
//! argument; process exit marks the end of the utterance. Stopping either
//! one kills the child process.
//!
//! Results flow back over unbounded channels as session-tagged events so the
//! REPL can feed them into the controllers.

use std::process::{Output, Stdio};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use voqit_core::config::SpeechConfig;
use voqit_core::error::VoqitError;
use voqit_speech::{
    Capability, DictationController, DictationSession, NarrationController, NarrationEvent,
    RecognitionEvent, SpeechRecognizer, SpeechSynthesizer, Utterance,
};

use crate::command::CommandLine;

/// Kill switch for the running child, if any.
#[derive(Debug, Default)]
struct RunningChild {
    cancel: Mutex<Option<oneshot::Sender<()>>>,
}

impl RunningChild {
    fn lock(&self) -> MutexGuard<'_, Option<oneshot::Sender<()>>> {
        self.cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new child, killing any previous one.
    fn replace(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        if let Some(previous) = self.lock().replace(tx) {
            let _ = previous.send(());
        }
        rx
    }

    /// Returns `true` if a child was still waiting to be killed.
    fn kill(&self) -> bool {
        match self.lock().take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }
}

fn runtime(err: fn(String) -> VoqitError) -> Result<Handle, VoqitError> {
    Handle::try_current().map_err(|e| err(e.to_string()))
}

/// First non-empty line of a recognizer's stdout.
fn first_line(stdout: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn recognition_event(session_id: Uuid, output: std::io::Result<Output>) -> RecognitionEvent {
    match output {
        Err(e) => RecognitionEvent::error(session_id, e.to_string()),
        Ok(output) if !output.status.success() => {
            RecognitionEvent::error(session_id, format!("recognizer exited with {}", output.status))
        }
        Ok(output) => match first_line(&output.stdout) {
            Some(text) => RecognitionEvent::result(session_id, text),
            None => RecognitionEvent::end(session_id),
        },
    }
}

// ---- Recognizer ----

pub struct CommandRecognizer {
    command: CommandLine,
    events: mpsc::UnboundedSender<RecognitionEvent>,
    running: RunningChild,
}

impl CommandRecognizer {
    pub fn new(command: CommandLine, events: mpsc::UnboundedSender<RecognitionEvent>) -> Self {
        Self {
            command,
            events,
            running: RunningChild::default(),
        }
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn start(&self, session: &DictationSession) -> Result<(), VoqitError> {
        let handle = runtime(VoqitError::Dictation)?;
        let _enter = handle.enter();

        let child = self
            .command
            .command()
            .env("VOQIT_LANGUAGE", &session.language)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                VoqitError::Dictation(format!("failed to start {}: {}", self.command, e))
            })?;

        let cancelled = self.running.replace();
        let events = self.events.clone();
        let session_id = session.id;

        handle.spawn(async move {
            let output = tokio::select! {
                output = child.wait_with_output() => output,
                _ = cancelled => {
                    tracing::debug!(%session_id, "Recognizer process killed");
                    return;
                }
            };
            let _ = events.send(recognition_event(session_id, output));
        });
        Ok(())
    }

    fn stop(&self) -> Result<(), VoqitError> {
        if self.running.kill() {
            tracing::debug!("Recognizer stop requested");
        }
        Ok(())
    }
}

// ---- Synthesizer ----

pub struct CommandSynthesizer {
    command: CommandLine,
    events: mpsc::UnboundedSender<NarrationEvent>,
    running: RunningChild,
}

impl CommandSynthesizer {
    pub fn new(command: CommandLine, events: mpsc::UnboundedSender<NarrationEvent>) -> Self {
        Self {
            command,
            events,
            running: RunningChild::default(),
        }
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn speak(&self, utterance: &Utterance) -> Result<(), VoqitError> {
        let handle = runtime(VoqitError::Narration)?;
        let _enter = handle.enter();

        let mut child = self
            .command
            .command()
            .arg(&utterance.text)
            .env("VOQIT_LANGUAGE", &utterance.language)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                VoqitError::Narration(format!("failed to start {}: {}", self.command, e))
            })?;

        let cancelled = self.running.replace();
        let events = self.events.clone();
        let utterance_id = utterance.id;

        handle.spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                _ = cancelled => {
                    tracing::debug!(%utterance_id, "Synthesizer process killed");
                    return;
                }
            };
            let event = match status {
                Ok(status) if status.success() => NarrationEvent::finished(utterance_id),
                Ok(status) => NarrationEvent::failed(
                    utterance_id,
                    format!("synthesizer exited with {}", status),
                ),
                Err(e) => NarrationEvent::failed(utterance_id, e.to_string()),
            };
            let _ = events.send(event);
        });
        Ok(())
    }

    fn cancel(&self) -> Result<(), VoqitError> {
        if self.running.kill() {
            tracing::debug!("Synthesizer cancel requested");
        }
        Ok(())
    }
}

// ---- Detection ----

/// Build the dictation capability from config, once at startup.
pub fn detect_dictation(
    config: &SpeechConfig,
    events: mpsc::UnboundedSender<RecognitionEvent>,
) -> Capability<DictationController> {
    let Some(command) = config.dictation_command.as_deref().and_then(CommandLine::resolve) else {
        tracing::info!("Dictation unavailable: no recognizer configured");
        return Capability::Unavailable;
    };
    tracing::info!(command = %command, "Dictation available");
    Capability::Available(DictationController::new(
        Box::new(CommandRecognizer::new(command, events)),
        config.language.clone(),
    ))
}

/// Build the narration capability from config, once at startup.
pub fn detect_narration(
    config: &SpeechConfig,
    events: mpsc::UnboundedSender<NarrationEvent>,
) -> Capability<NarrationController> {
    let Some(command) = config.narration_command.as_deref().and_then(CommandLine::resolve) else {
        tracing::info!("Narration unavailable: no synthesizer configured");
        return Capability::Unavailable;
    };
    tracing::info!(command = %command, "Narration available");
    Capability::Available(NarrationController::new(
        Box::new(CommandSynthesizer::new(command, events)),
        config.language.clone(),
    ))
}

//! Terminal front-end.
//!
//! Reads lines from stdin and renders the transcript on stdout. Submits run
//! on a background task so dictation, narration and the other commands stay
//! responsive while an answer is being generated.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use voqit_chat::{ChatSession, SubmitOutcome};
use voqit_core::types::{EntryKind, Role, TranscriptEntry};
use voqit_speech::{DictationState, NarrationEvent, NarrationState, RecognitionEvent};

use crate::share::{CopyOutcome, ShareOutcome, Sharer};

pub const WELCOME: &str = "Ask anything, get answers.";

const BUSY: &str = "Still generating the previous answer, please wait.";

const HELP: &str = "\
Type a question and press Enter. An empty line sends dictated text.
  /dictate      start or stop dictation
  /speak [n]    read answer n aloud, or stop reading (default: latest answer)
  /copy [n]     copy answer n
  /share [n]    share answer n
  /history      show the whole conversation
  /help         show this help
  /quit         exit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    SendPending,
    Dictate,
    Speak(Option<usize>),
    Copy(Option<usize>),
    Share(Option<usize>),
    History,
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::SendPending;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Ask(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let index = match parts.next().map(str::parse::<usize>) {
            None => None,
            Some(Ok(n)) if n > 0 => Some(n),
            Some(_) => return Command::Invalid(format!("Not an entry number: {}", line)),
        };

        match name {
            "dictate" | "mic" => Command::Dictate,
            "speak" | "say" => Command::Speak(index),
            "copy" => Command::Copy(index),
            "share" => Command::Share(index),
            "history" => Command::History,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            _ => Command::Invalid(format!("Unknown command: /{}. Type /help.", name)),
        }
    }
}

/// Render entry `number` (1-based) for display.
pub fn render_entry(number: usize, entry: &TranscriptEntry) -> String {
    let time = entry.created_at.format("%H:%M");
    match (entry.role, entry.kind) {
        (Role::Question, _) => format!("[{}] {} You: {}", number, time, entry.text),
        (Role::Answer, EntryKind::Normal) => format!("[{}] {} Voqit: {}", number, time, entry.text),
        (Role::Answer, _) => format!("[{}] {} ! {}", number, time, entry.text),
    }
}

/// Text of the answer to act on: entry `number`, or the latest answer.
pub fn select_answer(
    transcript: &[TranscriptEntry],
    number: Option<usize>,
) -> Result<&str, String> {
    match number {
        Some(n) => {
            let entry = transcript
                .get(n - 1)
                .ok_or_else(|| format!("No entry [{}].", n))?;
            if entry.role == Role::Answer && !entry.is_failure() {
                Ok(entry.text.as_str())
            } else {
                Err(format!("Entry [{}] is not an answer.", n))
            }
        }
        None => transcript
            .iter()
            .rev()
            .find(|e| e.role == Role::Answer && !e.is_failure())
            .map(|e| e.text.as_str())
            .ok_or_else(|| "No answers yet.".to_string()),
    }
}

pub struct Repl {
    session: Arc<ChatSession>,
    sharer: Sharer,
    recognitions: mpsc::UnboundedReceiver<RecognitionEvent>,
    narrations: mpsc::UnboundedReceiver<NarrationEvent>,
    done_tx: mpsc::UnboundedSender<SubmitOutcome>,
    done_rx: mpsc::UnboundedReceiver<SubmitOutcome>,
    /// Set when a submit is spawned, cleared when its outcome arrives.
    submitting: bool,
    shown: usize,
}

impl Repl {
    pub fn new(
        session: Arc<ChatSession>,
        sharer: Sharer,
        recognitions: mpsc::UnboundedReceiver<RecognitionEvent>,
        narrations: mpsc::UnboundedReceiver<NarrationEvent>,
    ) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            session,
            sharer,
            recognitions,
            narrations,
            done_tx,
            done_rx,
            submitting: false,
            shown: 0,
        }
    }

    fn print_welcome(&self) {
        println!("Voqit");
        println!("{}", WELCOME);
        println!(
            "Dictation: {}. Narration: {}.",
            if self.session.dictation_available() { "available" } else { "unavailable" },
            if self.session.narration_available() { "available" } else { "unavailable" },
        );
        println!("Type /help for commands.");
    }

    /// Run until `/quit` or end of input.
    pub async fn run(mut self) -> std::io::Result<()> {
        self.print_welcome();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        tracing::debug!("Input closed");
                        break;
                    };
                    if !self.handle_command(Command::parse(&line)).await {
                        break;
                    }
                }
                Some(outcome) = self.done_rx.recv() => self.show_outcome(outcome),
                Some(event) = self.recognitions.recv() => self.on_recognition(event),
                Some(event) = self.narrations.recv() => {
                    self.session.handle_narration(event);
                }
            }
        }
        Ok(())
    }

    /// Returns `false` when the loop should stop.
    async fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Ask(text) => {
                if self.is_busy() {
                    println!("{}", BUSY);
                } else {
                    self.session.set_pending_input(text.clone());
                    self.spawn_submit(text);
                }
            }
            Command::SendPending => {
                if self.is_busy() {
                    println!("{}", BUSY);
                } else {
                    let pending = self.session.pending_input();
                    if !pending.trim().is_empty() {
                        self.spawn_submit(pending);
                    }
                }
            }
            Command::Dictate => match self.session.toggle_dictation() {
                Ok(DictationState::Listening) => println!("Listening... (/dictate again to stop)"),
                Ok(DictationState::Idle) => println!("Stopped listening."),
                Err(e) => println!("{}", e),
            },
            Command::Speak(number) => self.speak(number),
            Command::Copy(number) => self.copy(number).await,
            Command::Share(number) => self.share(number).await,
            Command::History => {
                let transcript = self.session.transcript();
                if transcript.is_empty() {
                    println!("{}", WELCOME);
                }
                for (i, entry) in transcript.iter().enumerate() {
                    println!("{}", render_entry(i + 1, entry));
                }
                self.shown = transcript.len();
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
            Command::Invalid(message) => println!("{}", message),
        }
        true
    }

    fn is_busy(&self) -> bool {
        self.submitting || self.session.is_generating()
    }

    /// The question travels with the task, so later edits to the pending
    /// input cannot change what is sent.
    fn spawn_submit(&mut self, question: String) {
        self.submitting = true;
        println!("Generating answer...");
        let session = Arc::clone(&self.session);
        let done = self.done_tx.clone();
        tokio::spawn(async move {
            let outcome = session.submit(&question).await;
            let _ = done.send(outcome);
        });
    }

    fn show_outcome(&mut self, outcome: SubmitOutcome) {
        self.submitting = false;
        if outcome == SubmitOutcome::Busy {
            println!("{}", BUSY);
            return;
        }

        let transcript = self.session.transcript();
        for (i, entry) in transcript.iter().enumerate().skip(self.shown) {
            println!("{}", render_entry(i + 1, entry));
        }
        self.shown = transcript.len();

        if matches!(outcome, SubmitOutcome::RateLimited | SubmitOutcome::Failed) {
            println!("Press Enter to try again.");
        }
    }

    fn on_recognition(&mut self, event: RecognitionEvent) {
        let current = self
            .session
            .dictation()
            .and_then(|d| d.current_session())
            .is_some_and(|s| s.id == event.session_id);

        match self.session.handle_recognition(event) {
            Some(text) => {
                println!("Heard: {}", text);
                println!("Press Enter to send it, or type a new question.");
            }
            None if current => println!("Didn't catch that."),
            None => {}
        }
    }

    fn speak(&self, number: Option<usize>) {
        if self.session.narration_state() == NarrationState::Speaking {
            match self.session.toggle_narration("") {
                Ok(_) => println!("Stopped speaking."),
                Err(e) => println!("{}", e),
            }
            return;
        }

        let transcript = self.session.transcript();
        let text = match select_answer(&transcript, number) {
            Ok(text) => text,
            Err(message) => {
                println!("{}", message);
                return;
            }
        };
        match self.session.toggle_narration(text) {
            Ok(_) => println!("Speaking... (/speak again to stop)"),
            Err(e) => println!("{}", e),
        }
    }

    async fn copy(&self, number: Option<usize>) {
        let transcript = self.session.transcript();
        let text = match select_answer(&transcript, number) {
            Ok(text) => text,
            Err(message) => {
                println!("{}", message);
                return;
            }
        };
        match self.sharer.copy(text).await {
            Ok(CopyOutcome::Clipboard) => println!("Copied to clipboard!"),
            Ok(CopyOutcome::Print) => {
                println!("No clipboard program configured. The response:");
                println!("{}", text);
            }
            Err(e) => println!("{}", e),
        }
    }

    async fn share(&self, number: Option<usize>) {
        let transcript = self.session.transcript();
        let text = match select_answer(&transcript, number) {
            Ok(text) => text,
            Err(message) => {
                println!("{}", message);
                return;
            }
        };
        match self.sharer.share(text).await {
            Ok(ShareOutcome::Shared) => println!("Shared \"{}\".", self.sharer.title()),
            Ok(ShareOutcome::Cancelled) => {}
            Ok(outcome @ ShareOutcome::Copied { copy, .. }) => {
                if let Some(notice) = outcome.notice() {
                    println!("{}", notice);
                }
                if copy == CopyOutcome::Print {
                    println!("{}", self.sharer.title());
                    println!("{}", text);
                }
            }
            Err(e) => println!("{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use voqit_chat::{
        AnswerCache, BackoffPolicy, CompletionClient, CompletionTransport, TransportError,
    };
    use voqit_core::config::MessagesConfig;

    use super::*;

    // ---- Command parsing ----

    #[test]
    fn test_plain_text_is_a_question() {
        assert_eq!(Command::parse("  2+2?  "), Command::Ask("2+2?".to_string()));
    }

    #[test]
    fn test_empty_line_sends_pending() {
        assert_eq!(Command::parse(""), Command::SendPending);
        assert_eq!(Command::parse("   "), Command::SendPending);
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(Command::parse("/dictate"), Command::Dictate);
        assert_eq!(Command::parse("/speak"), Command::Speak(None));
        assert_eq!(Command::parse("/speak 4"), Command::Speak(Some(4)));
        assert_eq!(Command::parse("/copy 2"), Command::Copy(Some(2)));
        assert_eq!(Command::parse("/share"), Command::Share(None));
        assert_eq!(Command::parse("/history"), Command::History);
        assert_eq!(Command::parse("/help"), Command::Help);
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/exit"), Command::Quit);
    }

    #[test]
    fn test_bad_commands() {
        assert!(matches!(Command::parse("/dance"), Command::Invalid(m) if m.contains("/dance")));
        assert!(matches!(Command::parse("/speak x"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/copy 0"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/"), Command::Invalid(_)));
    }

    // ---- Rendering ----

    #[test]
    fn test_render_entries() {
        let q = render_entry(1, &TranscriptEntry::question("2+2?"));
        assert!(q.starts_with("[1] "));
        assert!(q.ends_with("You: 2+2?"));

        let a = render_entry(2, &TranscriptEntry::answer("4"));
        assert!(a.ends_with("Voqit: 4"));

        let f = render_entry(
            3,
            &TranscriptEntry::failure("Error occurred. Try again.", EntryKind::Failed),
        );
        assert!(f.ends_with("! Error occurred. Try again."));
    }

    // ---- Answer selection ----

    fn transcript() -> Vec<TranscriptEntry> {
        vec![
            TranscriptEntry::question("2+2?"),
            TranscriptEntry::answer("4"),
            TranscriptEntry::question("3+3?"),
            TranscriptEntry::answer("6"),
            TranscriptEntry::failure(
                "Rate limit exceeded. Try again later.",
                EntryKind::RateLimited,
            ),
        ]
    }

    #[test]
    fn test_select_latest_answer_skips_failures() {
        assert_eq!(select_answer(&transcript(), None), Ok("6"));
    }

    #[test]
    fn test_select_numbered_answer() {
        assert_eq!(select_answer(&transcript(), Some(2)), Ok("4"));
        assert!(select_answer(&transcript(), Some(1)).is_err());
        assert!(select_answer(&transcript(), Some(5)).is_err());
        assert!(select_answer(&transcript(), Some(99)).is_err());
    }

    #[test]
    fn test_select_with_no_answers() {
        assert_eq!(select_answer(&[], None), Err("No answers yet.".to_string()));
    }

    // ---- Submitting ----

    /// Answers every prompt with "answer to <prompt>" and records the prompts.
    #[derive(Default)]
    struct EchoTransport {
        prompts: Mutex<Vec<String>>,
    }

    impl EchoTransport {
        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionTransport for EchoTransport {
        async fn generate(&self, prompt: &str) -> Result<String, TransportError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(format!("answer to {}", prompt))
        }
    }

    fn echo_repl() -> (Repl, Arc<EchoTransport>) {
        let transport = Arc::new(EchoTransport::default());
        let client = CompletionClient::new(
            transport.clone(),
            Arc::new(AnswerCache::new()),
            BackoffPolicy::default(),
        );
        let session = ChatSession::new(client, MessagesConfig::default());
        let (_recognition_tx, recognitions) = mpsc::unbounded_channel();
        let (_narration_tx, narrations) = mpsc::unbounded_channel();
        let repl = Repl::new(
            Arc::new(session),
            Sharer::new("t", None, None),
            recognitions,
            narrations,
        );
        (repl, transport)
    }

    fn transcript_texts(repl: &Repl) -> Vec<String> {
        repl.session.transcript().into_iter().map(|e| e.text).collect()
    }

    #[tokio::test]
    async fn test_back_to_back_questions_refuse_the_second() {
        let (mut repl, transport) = echo_repl();

        assert!(repl.handle_command(Command::parse("first question")).await);
        assert!(repl.handle_command(Command::parse("second question")).await);

        let outcome = repl.done_rx.recv().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Answered);
        repl.show_outcome(outcome);

        assert!(repl.done_rx.try_recv().is_err());
        assert_eq!(transport.prompts(), vec!["first question"]);
        assert_eq!(
            transcript_texts(&repl),
            vec!["first question", "answer to first question"]
        );
    }

    #[tokio::test]
    async fn test_question_accepted_after_previous_outcome() {
        let (mut repl, transport) = echo_repl();

        repl.handle_command(Command::parse("first question")).await;
        let outcome = repl.done_rx.recv().await.unwrap();
        repl.show_outcome(outcome);
        assert!(!repl.is_busy());

        repl.handle_command(Command::parse("second question")).await;
        assert_eq!(repl.done_rx.recv().await, Some(SubmitOutcome::Answered));
        assert_eq!(transport.prompts(), vec!["first question", "second question"]);
        assert_eq!(repl.session.transcript_len(), 4);
    }

    #[tokio::test]
    async fn test_empty_line_while_submitting_sends_nothing() {
        let (mut repl, transport) = echo_repl();

        repl.handle_command(Command::parse("first question")).await;
        repl.session.set_pending_input("dictated words");
        repl.handle_command(Command::SendPending).await;

        repl.done_rx.recv().await.unwrap();
        assert!(repl.done_rx.try_recv().is_err());
        assert_eq!(transport.prompts(), vec!["first question"]);
    }

    #[test]
    fn test_busy_outcome_clears_submitting() {
        let (mut repl, _transport) = echo_repl();
        repl.submitting = true;
        repl.show_outcome(SubmitOutcome::Busy);
        assert!(!repl.is_busy());
        assert!(repl.session.transcript().is_empty());
    }
}

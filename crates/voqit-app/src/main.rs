//! Voqit application binary - composition root.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Build the completion client (Gemini transport + answer cache + backoff)
//! 3. Detect speech engines once and wire them into the chat session
//! 4. Run the terminal front-end until the user quits

mod cli;
mod command;
mod repl;
mod share;
mod speech;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;

use voqit_chat::{AnswerCache, BackoffPolicy, ChatSession, CompletionClient, GeminiTransport};
use voqit_core::config::VoqitConfig;

use crate::cli::CliArgs;
use crate::repl::Repl;
use crate::share::Sharer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config, read before tracing so the file's log level applies.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = match VoqitConfig::load(&config_file) {
        Ok(config) => (config, None),
        Err(e) => (VoqitConfig::default(), Some(e)),
    };
    args.apply_overrides(&mut config);

    // Tracing. Logs go to stderr so stdout carries only the conversation.
    let log_level = args.resolve_log_level(&config);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Voqit v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
    }

    // Completion pipeline.
    let api_key = match config.resolve_api_key() {
        Ok(key) => key,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start without an API key");
            return Err(e.into());
        }
    };
    let transport = GeminiTransport::from_config(&config.completion, &api_key);
    tracing::info!(
        model = %config.completion.model,
        endpoint = %transport.endpoint(),
        "Completion transport ready"
    );

    let cache = Arc::new(AnswerCache::from_config(&config.cache));
    let client = CompletionClient::new(
        Arc::new(transport),
        cache,
        BackoffPolicy::from_config(&config.retry),
    );

    // Speech capabilities, detected once.
    let (recognition_tx, recognition_rx) = mpsc::unbounded_channel();
    let (narration_tx, narration_rx) = mpsc::unbounded_channel();
    let session = ChatSession::new(client, config.messages.clone())
        .with_dictation(speech::detect_dictation(&config.speech, recognition_tx))
        .with_narration(speech::detect_narration(&config.speech, narration_tx));

    let sharer = Sharer::from_config(&config.share);

    Repl::new(Arc::new(session), sharer, recognition_rx, narration_rx)
        .run()
        .await?;

    tracing::info!("Voqit exiting");
    Ok(())
}

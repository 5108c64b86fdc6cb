//! Request pipeline for Voqit.
//!
//! Sits between a front-end and a remote completion endpoint:
//! exact-match answer cache, rate-limit backoff, the HTTP transport,
//! and the `ChatSession` that owns the transcript and the speech controllers.

pub mod backoff;
pub mod cache;
pub mod client;
pub mod error;
pub mod session;
pub mod transport;

pub use backoff::{AttemptOutcome, BackoffPolicy, RetryDecision, Sleeper, TokioSleeper};
pub use cache::AnswerCache;
pub use client::CompletionClient;
pub use error::{ChatError, CompletionError, TransportError};
pub use session::{ChatSession, SubmitOutcome};
pub use transport::{CompletionTransport, GeminiTransport};

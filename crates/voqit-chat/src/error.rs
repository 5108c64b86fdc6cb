//! Error types for the request pipeline.

use voqit_core::error::VoqitError;

/// Errors from a single call to the completion endpoint.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("rate limited by completion endpoint")]
    RateLimited,
    #[error("completion endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

/// Terminal outcome of `CompletionClient::complete` when no answer was produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("question cannot be blank")]
    InvalidInput,
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },
    #[error("request failed: {0}")]
    RequestFailed(String),
}

/// Errors surfaced by `ChatSession` speech operations.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("dictation is not available on this platform")]
    DictationUnavailable,
    #[error("narration is not available on this platform")]
    NarrationUnavailable,
    #[error("speech error: {0}")]
    Speech(String),
}

impl From<VoqitError> for ChatError {
    fn from(err: VoqitError) -> Self {
        ChatError::Speech(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        assert_eq!(
            TransportError::RateLimited.to_string(),
            "rate limited by completion endpoint"
        );
        let err = TransportError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "completion endpoint returned HTTP 500: boom");
        assert_eq!(
            TransportError::MalformedResponse("no candidates".to_string()).to_string(),
            "malformed completion response: no candidates"
        );
    }

    #[test]
    fn test_completion_error_display() {
        assert_eq!(
            CompletionError::InvalidInput.to_string(),
            "question cannot be blank"
        );
        assert_eq!(
            CompletionError::RateLimited { attempts: 3 }.to_string(),
            "rate limited after 3 attempts"
        );
        assert_eq!(
            CompletionError::RequestFailed("timeout".to_string()).to_string(),
            "request failed: timeout"
        );
    }

    #[test]
    fn test_chat_error_from_voqit_error() {
        let err: ChatError = VoqitError::Dictation("mic busy".to_string()).into();
        assert!(matches!(err, ChatError::Speech(_)));
        assert!(err.to_string().contains("mic busy"));
    }

    #[test]
    fn test_chat_error_unavailable_display() {
        assert_eq!(
            ChatError::DictationUnavailable.to_string(),
            "dictation is not available on this platform"
        );
        assert_eq!(
            ChatError::NarrationUnavailable.to_string(),
            "narration is not available on this platform"
        );
    }
}

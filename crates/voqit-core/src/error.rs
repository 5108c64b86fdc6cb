use thiserror::Error;

/// Top-level error type for Voqit.
///
/// Subsystem crates define their own error types and implement
/// `From<VoqitError>` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VoqitError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dictation error: {0}")]
    Dictation(String),

    #[error("Narration error: {0}")]
    Narration(String),

    #[error("Share error: {0}")]
    Share(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for VoqitError {
    fn from(err: toml::de::Error) -> Self {
        VoqitError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Voqit operations.
pub type Result<T> = std::result::Result<T, VoqitError>;

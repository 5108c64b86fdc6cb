//! Copy and share actions for answers.
//!
//! Copy pipes the answer into the configured clipboard program, or asks the
//! caller to print it when none is configured. Share pipes it into the share
//! program with the configured title; when sharing is unavailable or fails,
//! the answer is copied instead and the caller is told so. A share the user
//! dismissed (the configured cancel exit code) does nothing further.

use voqit_core::config::ShareConfig;
use voqit_core::error::VoqitError;

use crate::command::CommandLine;

/// Where a copied answer ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Written to the clipboard program.
    Clipboard,
    /// No clipboard program; the caller should print the text.
    Print,
}

/// Why share fell back to copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareFallback {
    Unsupported,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    /// The user dismissed the share program.
    Cancelled,
    Copied {
        reason: ShareFallback,
        copy: CopyOutcome,
    },
}

impl ShareOutcome {
    /// Notice shown to the user after a share attempt.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            ShareOutcome::Shared | ShareOutcome::Cancelled => None,
            ShareOutcome::Copied {
                reason: ShareFallback::Unsupported,
                copy: CopyOutcome::Clipboard,
            } => Some("Sharing is not supported here. The response has been copied to your clipboard instead."),
            ShareOutcome::Copied {
                reason: ShareFallback::Failed,
                copy: CopyOutcome::Clipboard,
            } => Some("Sharing failed. The response has been copied to your clipboard instead."),
            ShareOutcome::Copied {
                reason: ShareFallback::Unsupported,
                copy: CopyOutcome::Print,
            } => Some("Sharing is not supported here. The response is printed below instead."),
            ShareOutcome::Copied {
                reason: ShareFallback::Failed,
                copy: CopyOutcome::Print,
            } => Some("Sharing failed. The response is printed below instead."),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sharer {
    title: String,
    copy: Option<CommandLine>,
    share: Option<CommandLine>,
    cancel_exit_code: i32,
}

impl Sharer {
    pub fn new(
        title: impl Into<String>,
        copy: Option<CommandLine>,
        share: Option<CommandLine>,
    ) -> Self {
        Self {
            title: title.into(),
            copy,
            share,
            cancel_exit_code: ShareConfig::default().cancel_exit_code,
        }
    }

    pub fn with_cancel_exit_code(mut self, code: i32) -> Self {
        self.cancel_exit_code = code;
        self
    }

    /// Resolve the configured programs on `PATH`.
    pub fn from_config(config: &ShareConfig) -> Self {
        Self::new(
            config.title.clone(),
            config.copy_command.as_deref().and_then(CommandLine::resolve),
            config.share_command.as_deref().and_then(CommandLine::resolve),
        )
        .with_cancel_exit_code(config.cancel_exit_code)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub async fn copy(&self, text: &str) -> Result<CopyOutcome, VoqitError> {
        let Some(ref command) = self.copy else {
            return Ok(CopyOutcome::Print);
        };
        command
            .pipe(&[], text)
            .await
            .map_err(|e| VoqitError::Share(format!("copy failed: {}", e)))?;
        tracing::debug!(text_len = text.len(), "Answer copied");
        Ok(CopyOutcome::Clipboard)
    }

    pub async fn share(&self, text: &str) -> Result<ShareOutcome, VoqitError> {
        let reason = match self.share {
            Some(ref command) => match command.pipe_status(&[self.title.as_str()], text).await {
                Ok(status) if status.success() => {
                    tracing::debug!(title = %self.title, "Answer shared");
                    return Ok(ShareOutcome::Shared);
                }
                Ok(status) if status.code() == Some(self.cancel_exit_code) => {
                    tracing::debug!("Share dismissed");
                    return Ok(ShareOutcome::Cancelled);
                }
                Ok(status) => {
                    tracing::warn!(%status, "Share failed, copying instead");
                    ShareFallback::Failed
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Share failed, copying instead");
                    ShareFallback::Failed
                }
            },
            None => ShareFallback::Unsupported,
        };
        let copy = self.copy(text).await?;
        Ok(ShareOutcome::Copied { reason, copy })
    }
}

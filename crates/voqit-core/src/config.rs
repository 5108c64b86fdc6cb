use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, VoqitError};

/// Top-level configuration for Voqit.
///
/// Loaded from `~/.voqit/config.toml` by default. Every section falls back to
/// its defaults when missing, so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoqitConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub messages: MessagesConfig,
    #[serde(default)]
    pub share: ShareConfig,
}

impl VoqitConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VoqitConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Resolve the completion API key.
    ///
    /// An inline `completion.api_key` wins; otherwise the environment variable
    /// named by `completion.api_key_env` is read.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(ref key) = self.completion.api_key {
            if !key.trim().is_empty() {
                return Ok(key.clone());
            }
        }
        match std::env::var(&self.completion.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(VoqitError::Config(format!(
                "no API key: set completion.api_key or the {} environment variable",
                self.completion.api_key_env
            ))),
        }
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Remote completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL of the generative-language API, without a trailing slash.
    pub base_url: String,
    /// Model name inserted into the `generateContent` path.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Inline API key. Takes priority over `api_key_env` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "VOQIT_API_KEY".to_string(),
            api_key: None,
        }
    }
}

/// Backoff settings for rate-limited completions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry, doubled for each later retry.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
        }
    }
}

/// Answer cache settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached answers. Unbounded when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_entries: Option<usize>,
}

/// Speech input/output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// BCP-47 language tag handed to the recognizer and synthesizer.
    pub language: String,
    /// External recognizer program. Its first non-empty stdout line is the dictated text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dictation_command: Option<String>,
    /// External text-to-speech program. Receives the text as its last argument.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration_command: Option<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            dictation_command: None,
            narration_command: None,
        }
    }
}

/// User-facing transcript messages for failed completions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub rate_limited: String,
    pub request_failed: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            rate_limited: "Rate limit exceeded. Try again later.".to_string(),
            request_failed: "Error occurred. Try again.".to_string(),
        }
    }
}

/// Copy and share targets for answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Title attached to shared answers.
    pub title: String,
    /// Clipboard program. Receives the answer on stdin (e.g. `pbcopy`, `wl-copy`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_command: Option<String>,
    /// Share program. Receives the title as its last argument and the answer on stdin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_command: Option<String>,
    /// Exit code the share program uses when the user dismisses it.
    /// Nothing is copied and no notice is shown in that case.
    pub cancel_exit_code: i32,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            title: "Voqit-Ai Response".to_string(),
            copy_command: None,
            share_command: None,
            cancel_exit_code: 130,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = VoqitConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.completion.model, "gemini-2.0-flash");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 2000);
        assert!(config.cache.max_entries.is_none());
        assert_eq!(config.speech.language, "en-US");
        assert_eq!(
            config.messages.rate_limited,
            "Rate limit exceeded. Try again later."
        );
        assert_eq!(config.messages.request_failed, "Error occurred. Try again.");
        assert_eq!(config.share.title, "Voqit-Ai Response");
        assert!(config.share.copy_command.is_none());
        assert_eq!(config.share.cancel_exit_code, 130);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[completion]
base_url = "http://localhost:9000/v1beta"
model = "gemini-1.5-pro"
api_key_env = "MY_KEY"

[retry]
max_attempts = 5
base_delay_ms = 100

[cache]
max_entries = 64

[speech]
language = "fr-FR"
narration_command = "espeak"

[share]
copy_command = "wl-copy"
cancel_exit_code = 1
"#;
        let file = create_temp_config(content);
        let config = VoqitConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.completion.base_url, "http://localhost:9000/v1beta");
        assert_eq!(config.completion.model, "gemini-1.5-pro");
        assert_eq!(config.completion.api_key_env, "MY_KEY");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 100);
        assert_eq!(config.cache.max_entries, Some(64));
        assert_eq!(config.speech.language, "fr-FR");
        assert_eq!(config.speech.narration_command.as_deref(), Some("espeak"));
        assert!(config.speech.dictation_command.is_none());
        assert_eq!(config.share.copy_command.as_deref(), Some("wl-copy"));
        assert_eq!(config.share.title, "Voqit-Ai Response");
        assert_eq!(config.share.cancel_exit_code, 1);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let content = r#"
[retry]
max_attempts = 1
"#;
        let file = create_temp_config(content);
        let config = VoqitConfig::load(file.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.retry.base_delay_ms, 2000);
        assert_eq!(config.completion.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_config_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = VoqitConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("this is {{ not valid TOML");
        let result = VoqitConfig::load(file.path());
        assert!(matches!(result, Err(VoqitError::Config(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = VoqitConfig::load(Path::new("/nonexistent/voqit.toml"));
        assert!(matches!(result, Err(VoqitError::Io(_))));
    }

    #[test]
    fn test_resolve_api_key_prefers_inline() {
        let mut config = VoqitConfig::default();
        config.completion.api_key = Some("inline-key".to_string());
        config.completion.api_key_env = "VOQIT_TEST_UNUSED_KEY_VAR".to_string();
        assert_eq!(config.resolve_api_key().unwrap(), "inline-key");
    }

    #[test]
    fn test_resolve_api_key_from_env() {
        let mut config = VoqitConfig::default();
        config.completion.api_key_env = "VOQIT_TEST_RESOLVE_KEY".to_string();
        std::env::set_var("VOQIT_TEST_RESOLVE_KEY", "env-key");
        assert_eq!(config.resolve_api_key().unwrap(), "env-key");
        std::env::remove_var("VOQIT_TEST_RESOLVE_KEY");
    }

    #[test]
    fn test_resolve_api_key_missing() {
        let mut config = VoqitConfig::default();
        config.completion.api_key_env = "VOQIT_TEST_DEFINITELY_UNSET".to_string();
        let err = config.resolve_api_key().unwrap_err();
        assert!(err.to_string().contains("VOQIT_TEST_DEFINITELY_UNSET"));
    }
}

//! CLI argument definitions for the Voqit terminal client.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use voqit_core::config::VoqitConfig;

/// Voqit: ask anything, get answers, by keyboard or by voice.
#[derive(Parser, Debug)]
#[command(name = "voqit", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Completion model name, e.g. gemini-2.0-flash.
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Base URL of the completion API.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Disable dictation and narration even if engines are configured.
    #[arg(long = "no-speech")]
    pub no_speech: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > VOQIT_CONFIG env var > platform default (~/.voqit/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("VOQIT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config: &VoqitConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.general.log_level.clone())
    }

    /// Write command-line overrides into a loaded config.
    pub fn apply_overrides(&self, config: &mut VoqitConfig) {
        if let Some(ref model) = self.model {
            config.completion.model = model.clone();
        }
        if let Some(ref base_url) = self.base_url {
            config.completion.base_url = base_url.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if self.no_speech {
            config.speech.dictation_command = None;
            config.speech.narration_command = None;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".voqit").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".voqit").join("config.toml");
    }
    PathBuf::from("config.toml")
}

//! Configuration from `scribe.toml` with environment fallbacks.
//!
//! A missing file is scaffolded with defaults on first run so users can fill
//! in their keys without touching code. API keys resolve from the file
//! first, then from the environment.

use crate::error::{ScribeError, ScribeResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_stt_model() -> String {
    "stt-rt-preview".to_string()
}

fn default_llm_model() -> String {
    "meta-llama/llama-3.3-70b-instruct".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScribeConfig {
    /// Realtime transcription service API key (env: SONIOX_API_KEY).
    #[serde(default)]
    pub stt_api_key: Option<String>,

    /// Realtime transcription model.
    #[serde(default = "default_stt_model")]
    pub stt_model: String,

    /// Summarization service API key (env: OPENROUTER_API_KEY or
    /// SCRIBE_LLM_API_KEY).
    #[serde(default)]
    pub llm_api_key: Option<String>,

    /// Summarization model.
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Root for transcripts and meeting notes.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Optional notes-format template file; the embedded default is used
    /// otherwise.
    #[serde(default)]
    pub template_path: Option<PathBuf>,
}

impl Default for ScribeConfig {
    fn default() -> Self {
        Self {
            stt_api_key: None,
            stt_model: default_stt_model(),
            llm_api_key: None,
            llm_model: default_llm_model(),
            output_dir: default_output_dir(),
            template_path: None,
        }
    }
}

impl ScribeConfig {
    pub fn default_path() -> PathBuf {
        PathBuf::from("scribe.toml")
    }

    pub fn load() -> ScribeResult<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from `path`, or scaffold a default file when it does not exist.
    pub fn load_from_path(path: &Path) -> ScribeResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)
                .map_err(|e| ScribeError::Config(format!("{}: {}", path.display(), e)))
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            Ok(config)
        }
    }

    pub fn save_to_path(&self, path: &Path) -> ScribeResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ScribeError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Transcription key: file first, then SONIOX_API_KEY.
    pub fn stt_api_key(&self) -> Option<String> {
        self.stt_api_key
            .clone()
            .or_else(|| std::env::var("SONIOX_API_KEY").ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    /// Summarization key: file first, then SCRIBE_LLM_API_KEY, then
    /// OPENROUTER_API_KEY.
    pub fn llm_api_key(&self) -> Option<String> {
        self.llm_api_key
            .clone()
            .or_else(|| std::env::var("SCRIBE_LLM_API_KEY").ok())
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }

    pub fn transcript_dir(&self) -> PathBuf {
        self.output_dir.join("transcripts")
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.output_dir.join("meeting_notes")
    }

    pub fn ensure_directories(&self) -> ScribeResult<()> {
        fs::create_dir_all(self.transcript_dir())?;
        fs::create_dir_all(self.notes_dir())?;
        Ok(())
    }

    /// Notes template: the configured file, or the embedded default.
    pub fn notes_template(&self) -> String {
        if let Some(path) = &self.template_path {
            match fs::read_to_string(path) {
                Ok(template) => return template,
                Err(e) => warn!(
                    "template {} unreadable ({}); using the built-in format",
                    path.display(),
                    e
                ),
            }
        }
        crate::summarize::DEFAULT_TEMPLATE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_scaffolded_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scribe.toml");

        let config = ScribeConfig::load_from_path(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert!(config.stt_api_key.is_none());

        // reloading parses the scaffolded file
        let reloaded = ScribeConfig::load_from_path(&path).unwrap();
        assert_eq!(reloaded.stt_model, config.stt_model);
    }

    #[test]
    fn file_key_wins_over_environment() {
        let config = ScribeConfig {
            stt_api_key: Some("from-file".to_string()),
            ..ScribeConfig::default()
        };
        assert_eq!(config.stt_api_key().as_deref(), Some("from-file"));
    }

    #[test]
    fn blank_keys_resolve_to_none() {
        let config = ScribeConfig {
            llm_api_key: Some("   ".to_string()),
            ..ScribeConfig::default()
        };
        assert_eq!(config.llm_api_key(), None);
    }

    #[test]
    fn output_subdirectories_derive_from_root() {
        let config = ScribeConfig {
            output_dir: PathBuf::from("sessions"),
            ..ScribeConfig::default()
        };
        assert_eq!(config.transcript_dir(), PathBuf::from("sessions/transcripts"));
        assert_eq!(config.notes_dir(), PathBuf::from("sessions/meeting_notes"));
    }

    #[test]
    fn template_falls_back_when_file_missing() {
        let config = ScribeConfig {
            template_path: Some(PathBuf::from("/nonexistent/template.txt")),
            ..ScribeConfig::default()
        };
        assert!(config.notes_template().contains("## Key Points"));
    }
}

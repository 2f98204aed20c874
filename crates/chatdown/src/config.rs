//! Configuration for chatdown.
//!
//! A TOML document selects the site adapter, tunes the Markdown output and
//! the streaming detector. Every field has a default, so an empty file is a
//! valid configuration.
//!
//! ```toml
//! site = "gemini"
//!
//! [markdown]
//! heading_style = "setext"
//! bullet_list_marker = "*"
//! math_fallback_max_chars = 120
//!
//! [streaming]
//! debounce_ms = 500
//! ```

use std::path::Path;
use std::time::Duration;

use chatdown_core::Options;
use serde::{Deserialize, Serialize};

use crate::streaming::DEFAULT_DEBOUNCE;
use crate::{ChatdownError, Result};

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatdownConfig {
    /// Adapter name (`chatgpt`, `gemini`, `claude`, `deepseek`, `generic`).
    /// Detected from the page URL when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,

    /// Markdown output options.
    #[serde(default)]
    pub markdown: Options,

    /// Streaming detector settings.
    #[serde(default)]
    pub streaming: StreamingConfig,
}

/// `[streaming]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Quiet period after the last added node, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl StreamingConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

impl ChatdownConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ChatdownError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ChatdownError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(?path, "loaded config file");

        Self::from_toml_str(&content).map_err(|e| match e {
            ChatdownError::Config(msg) => {
                ChatdownError::Config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ChatdownError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        let fence = &self.markdown.fence;
        let fence_char = fence.chars().next();
        if !matches!(fence_char, Some('`') | Some('~')) || fence.chars().any(|c| Some(c) != fence_char)
        {
            return Err(ChatdownError::Config(format!(
                "fence must be backticks or tildes, got `{fence}`"
            )));
        }
        if !matches!(self.markdown.bullet_list_marker, '-' | '*' | '+') {
            return Err(ChatdownError::Config(format!(
                "bullet_list_marker must be -, * or +, got `{}`",
                self.markdown.bullet_list_marker
            )));
        }
        if !matches!(self.markdown.em_delimiter, '*' | '_') {
            return Err(ChatdownError::Config(format!(
                "em_delimiter must be * or _, got `{}`",
                self.markdown.em_delimiter
            )));
        }
        Ok(())
    }
}

//! Configuration loaded from `chat_commands.toml`.
//!
//! ```toml
//! command_prefix = "!"
//!
//! [suggestions]
//! invalid_color = "#FF0000"
//! suggestion_color = "#444444"
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML, or has fields of the wrong type.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configured command prefix was empty.
    #[error("command prefix must not be empty")]
    EmptyPrefix,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Text that marks a chat message as a command. Compared case-insensitively.
    #[serde(default = "default_prefix")]
    pub command_prefix: String,

    /// Colors of the suggestion overlay.
    #[serde(default)]
    pub suggestions: SuggestionColors,
}

/// Colors used to decorate the input field while a command is being typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionColors {
    /// Color of text that does not parse.
    #[serde(default = "default_invalid_color")]
    pub invalid_color: String,

    /// Color of the not-yet-accepted completion.
    #[serde(default = "default_suggestion_color")]
    pub suggestion_color: String,
}

fn default_prefix() -> String {
    "!".to_owned()
}

fn default_invalid_color() -> String {
    "#FF0000".to_owned()
}

fn default_suggestion_color() -> String {
    "#444444".to_owned()
}

impl Default for SuggestionColors {
    fn default() -> Self {
        SuggestionColors {
            invalid_color: default_invalid_color(),
            suggestion_color: default_suggestion_color(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            command_prefix: default_prefix(),
            suggestions: SuggestionColors::default(),
        }
    }
}

impl Config {
    /// Parses configuration from TOML text. The prefix is lower-cased.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        if config.command_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        config.command_prefix = config.command_prefix.to_lowercase();
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Sets the command prefix, lower-casing it.
    pub fn with_prefix(mut self, prefix: &str) -> Result<Self, ConfigError> {
        if prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        self.command_prefix = prefix.to_lowercase();
        Ok(self)
    }
}

/// Strips `prefix` from the start of `text`, ignoring case. Returns the text after the prefix.
pub fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }

    let offset = chars.next().map(|(index, _)| index).unwrap_or(text.len());
    Some(&text[offset ..])
}

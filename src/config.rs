//! Configuration loading and management.
//!
//! [`Options`] is the option bag applied before the loop starts. [`Config`]
//! is the on-disk form: an `[options]` table plus `[[servers]]` entries for
//! the work item capability.

use crate::error::ConfigError;
use crate::workitems::ServerEntry;
use crossterm::style::Color;
use regex::RegexBuilder;
use serde::Deserialize;
use std::path::Path;

fn default_prompt() -> String {
    ">".to_string()
}

/// Regex modifiers applied when a pattern is compiled.
///
/// Not part of a pattern's identity: two registrations with the same
/// expression text collide whatever their options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
    pub ignore_whitespace: bool,
    pub unicode: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            case_insensitive: false,
            multi_line: false,
            dot_matches_new_line: false,
            ignore_whitespace: false,
            unicode: true,
        }
    }
}

impl MatchOptions {
    /// Default options with case-insensitive matching.
    pub fn case_insensitive() -> Self {
        Self {
            case_insensitive: true,
            ..Self::default()
        }
    }

    /// Apply these modifiers to a regex builder.
    pub(crate) fn apply<'b>(&self, builder: &'b mut RegexBuilder) -> &'b mut RegexBuilder {
        builder
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .ignore_whitespace(self.ignore_whitespace)
            .unicode(self.unicode)
    }
}

/// Interpreter options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Text written before each read, without a trailing newline.
    pub prompt: String,
    /// Write one blank line after each matched command.
    pub line_break_between_commands: bool,
    /// Written once before the first prompt. Skipped when empty.
    pub header_text: String,
    /// Strip leading and trailing whitespace before matching.
    pub trim_command: bool,
    /// Modifiers for patterns registered without explicit options.
    pub default_match_options: MatchOptions,
    /// Wrap patterns that carry neither a start nor an end anchor so they
    /// must match the whole line.
    pub auto_anchor_patterns: bool,
    /// `None` keeps the terminal's current color.
    pub header_color: Option<Color>,
    pub prompt_color: Option<Color>,
    pub input_color: Option<Color>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            line_break_between_commands: false,
            header_text: String::new(),
            trim_command: true,
            default_match_options: MatchOptions::default(),
            auto_anchor_patterns: false,
            header_color: None,
            prompt_color: None,
            input_color: None,
        }
    }
}

/// On-disk interpreter configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub options: Options,
    /// Work item tracking servers exposed to handlers.
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

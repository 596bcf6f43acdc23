//! Pattern registry.
//!
//! Patterns are kept in registration order and resolved by linear scan, so
//! when several patterns match a line the one registered first wins.
//! Expression text is the identity key: registering the same text twice
//! fails regardless of match options, and a failed registration leaves the
//! registry untouched.

use super::context::CommandMatch;
use super::traits::Handler;
use crate::config::MatchOptions;
use crate::error::RegistrationError;
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use tracing::debug;

/// A compiled pattern expression with its match modifiers.
#[derive(Debug, Clone)]
pub struct Pattern {
    text: String,
    options: MatchOptions,
    regex: Regex,
}

impl Pattern {
    /// Compile `text` with `options`.
    pub fn new(text: &str, options: MatchOptions) -> Result<Self, RegistrationError> {
        let regex = options
            .apply(&mut RegexBuilder::new(text))
            .build()
            .map_err(|source| RegistrationError::InvalidPattern {
                pattern: text.to_string(),
                source,
            })?;
        Ok(Self {
            text: text.to_string(),
            options,
            regex,
        })
    }

    /// Expression text as stored (after any auto-anchoring).
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// Match `line`, returning owned captures on success.
    pub fn captures(&self, line: &str) -> Option<CommandMatch> {
        self.regex
            .captures(line)
            .map(|caps| CommandMatch::from_captures(&self.regex, &caps))
    }
}

/// Identity is the expression text alone.
impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Pattern {}

/// A pattern and the handler it owns.
#[derive(Debug)]
pub struct Entry {
    pub pattern: Pattern,
    pub handler: Handler,
}

/// Ordered, duplicate-free set of registered commands.
#[derive(Debug, Default)]
pub struct Registry {
    entries: Vec<Entry>,
    auto_anchor: bool,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable auto-anchoring for subsequent registrations.
    pub fn set_auto_anchor(&mut self, enabled: bool) {
        self.auto_anchor = enabled;
    }

    /// Register `handler` for `pattern`.
    ///
    /// With auto-anchoring on, an unanchored pattern is rewritten before the
    /// duplicate check, so the stored text is the anchored form.
    pub fn register(
        &mut self,
        pattern: &str,
        options: MatchOptions,
        handler: Handler,
    ) -> Result<(), RegistrationError> {
        let text = if self.auto_anchor {
            anchor(pattern)
        } else {
            Cow::Borrowed(pattern)
        };

        if self.contains(&text) {
            debug!(pattern = %text, "Rejected duplicate pattern");
            return Err(RegistrationError::DuplicatePattern(text.into_owned()));
        }

        let pattern = Pattern::new(&text, options)?;
        debug!(
            pattern = %pattern.text(),
            suspending = handler.is_suspending(),
            position = self.entries.len(),
            "Registered command"
        );
        self.entries.push(Entry { pattern, handler });
        Ok(())
    }

    /// Whether a pattern with exactly this expression text is registered.
    pub fn contains(&self, text: &str) -> bool {
        self.entries.iter().any(|e| e.pattern.text() == text)
    }

    /// First entry, in registration order, whose pattern matches `line`.
    pub fn find(&self, line: &str) -> Option<(&Entry, CommandMatch)> {
        self.entries
            .iter()
            .find_map(|entry| entry.pattern.captures(line).map(|m| (entry, m)))
    }

    /// Registered patterns in resolution order.
    pub fn patterns(&self) -> impl Iterator<Item = &Pattern> {
        self.entries.iter().map(|e| &e.pattern)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Wrap `pattern` so it must match a whole line, unless it already carries
/// a start or an end anchor.
pub fn anchor(pattern: &str) -> Cow<'_, str> {
    if has_start_anchor(pattern) || has_end_anchor(pattern) {
        Cow::Borrowed(pattern)
    } else {
        Cow::Owned(format!("^(?:{pattern})$"))
    }
}

fn has_start_anchor(pattern: &str) -> bool {
    pattern.starts_with('^') || pattern.starts_with(r"\A")
}

fn has_end_anchor(pattern: &str) -> bool {
    // `$` is an anchor unless escaped; `\z` is an anchor only when its
    // backslash is not itself escaped.
    if let Some(rest) = pattern.strip_suffix('$') {
        return trailing_backslashes(rest) % 2 == 0;
    }
    if let Some(rest) = pattern.strip_suffix('z') {
        return trailing_backslashes(rest) % 2 == 1;
    }
    false
}

fn trailing_backslashes(s: &str) -> usize {
    s.chars().rev().take_while(|&c| c == '\\').count()
}

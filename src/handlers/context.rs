//! Per-invocation command context.
//!
//! A [`CommandContext`] is built fresh for every dispatched line, immediately
//! before its handler runs, and dropped when the handler returns. Building
//! one is pure: no I/O happens here.

use crate::terminal::Terminal;
use crate::workitems::WorkItems;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Owned capture groups of the pattern that matched.
///
/// Group 0 is the whole match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandMatch {
    groups: Vec<Option<String>>,
    names: HashMap<String, usize>,
}

impl CommandMatch {
    pub(crate) fn from_captures(regex: &Regex, captures: &Captures<'_>) -> Self {
        let groups = captures
            .iter()
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect();
        let names = regex
            .capture_names()
            .enumerate()
            .filter_map(|(index, name)| name.map(|n| (n.to_string(), index)))
            .collect();
        Self { groups, names }
    }

    /// Text of group `index`, if that group participated in the match.
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index)?.as_deref()
    }

    /// Text of the named group `name`, if it participated in the match.
    pub fn name(&self, name: &str) -> Option<&str> {
        self.group(*self.names.get(name)?)
    }

    /// Number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Everything a handler receives about the line it was matched against.
#[derive(Debug, Clone)]
pub struct CommandContext {
    line: String,
    matched: CommandMatch,
    args: Vec<String>,
    work_items: WorkItems,
    terminal: Terminal,
}

impl CommandContext {
    /// Build the context for `line`, which matched with `matched`.
    pub fn new(line: &str, matched: CommandMatch, work_items: WorkItems, terminal: Terminal) -> Self {
        Self {
            line: line.to_string(),
            matched,
            args: split_args(line),
            work_items,
            terminal,
        }
    }

    /// The line as matched (after optional trimming).
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Capture groups of the pattern that matched.
    pub fn matched(&self) -> &CommandMatch {
        &self.matched
    }

    /// The line split on spaces, empty tokens discarded.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Work item tracking servers registered before the loop started.
    pub fn work_items(&self) -> &WorkItems {
        &self.work_items
    }

    /// The interpreter's terminal, for output and follow-up questions.
    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }
}

/// Split on single spaces, collapsing repeats. Other whitespace is kept
/// inside tokens.
pub fn split_args(line: &str) -> Vec<String> {
    line.split(' ')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

//! Work item tracking capability.
//!
//! Servers are registered by unique name before the loop starts and exposed
//! read-only to handlers through [`WorkItems`]. Every call names the server
//! it targets; naming one that was never registered fails with
//! [`WorkItemError::UnknownServer`] before any request is sent.

mod client;
mod types;

pub use client::WorkItems;
pub use types::{
    IterationAttributes, PatchOp, PatchOperation, TeamIteration, WorkItem, WorkItemExpand,
    WorkItemFields, WorkItemRelation,
};

use crate::error::RegistrationError;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised by work item calls.
#[derive(Debug, Error)]
pub enum WorkItemError {
    #[error("work item server '{0}' was not found")]
    UnknownServer(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid url for server '{server}': {reason}")]
    InvalidUrl { server: String, reason: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded {status}: {body}")]
    Status { status: u16, body: String },
}

/// A registered work item tracking server.
#[derive(Clone, Deserialize)]
pub struct ServerEntry {
    /// Unique name handlers use to address the server.
    pub name: String,
    /// Collection url, e.g. `https://dev.azure.com/my-org`.
    pub url: String,
    pub personal_access_token: String,
}

impl ServerEntry {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        personal_access_token: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            personal_access_token: personal_access_token.into(),
        }
    }
}

impl std::fmt::Debug for ServerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerEntry")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("personal_access_token", &"<redacted>")
            .finish()
    }
}

/// Registered servers, unique by name.
#[derive(Debug, Clone, Default)]
pub struct ServerSet {
    entries: Vec<ServerEntry>,
}

impl ServerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a server.
    ///
    /// Fails on a duplicate name or a blank url or token, leaving the set
    /// unchanged.
    pub fn add(&mut self, entry: ServerEntry) -> Result<(), RegistrationError> {
        if self.get(&entry.name).is_some() {
            return Err(RegistrationError::DuplicateServer(entry.name));
        }
        if entry.url.trim().is_empty() {
            return Err(RegistrationError::MissingServerUrl(entry.name));
        }
        if entry.personal_access_token.trim().is_empty() {
            return Err(RegistrationError::MissingServerToken(entry.name));
        }

        tracing::debug!(server = %entry.name, url = %entry.url, "Registered work item server");
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ServerEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServerEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ServerEntry {
        ServerEntry::new(name, "https://dev.example.com/org", "token")
    }

    #[test]
    fn add_accepts_unique_names() {
        let mut set = ServerSet::new();
        set.add(entry("main")).unwrap();
        set.add(entry("legacy")).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get("legacy").is_some());
        assert!(set.get("other").is_none());
    }

    #[test]
    fn duplicate_name_is_rejected_without_mutation() {
        let mut set = ServerSet::new();
        set.add(entry("main")).unwrap();
        let err = set
            .add(ServerEntry::new("main", "https://elsewhere.example.com", "t2"))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateServer(ref n) if n == "main"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("main").unwrap().url, "https://dev.example.com/org");
    }

    #[test]
    fn blank_url_is_rejected() {
        let mut set = ServerSet::new();
        let err = set.add(ServerEntry::new("main", "   ", "token")).unwrap_err();
        assert!(matches!(err, RegistrationError::MissingServerUrl(_)));
        assert!(set.is_empty());
    }

    #[test]
    fn blank_token_is_rejected() {
        let mut set = ServerSet::new();
        let err = set
            .add(ServerEntry::new("main", "https://dev.example.com", ""))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::MissingServerToken(_)));
        assert!(set.is_empty());
    }

    #[test]
    fn debug_output_redacts_token() {
        let rendered = format!("{:?}", ServerEntry::new("main", "https://x", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}

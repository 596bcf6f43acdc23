//! Unified error handling for rexrepl.
//!
//! Registration errors abort application wiring before the loop starts.
//! Dispatch errors are contained by the dispatcher and reported as a single
//! `Error: <message>` line; they never reach the caller of `run`.

use thiserror::Error;

// ============================================================================
// Registration Errors (wiring time)
// ============================================================================

/// Errors raised while registering commands or capability servers.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("pattern already registered: {0}")]
    DuplicatePattern(String),

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("server name already registered: {0}")]
    DuplicateServer(String),

    #[error("server '{0}' requires a url")]
    MissingServerUrl(String),

    #[error("server '{0}' requires a personal access token")]
    MissingServerToken(String),
}

impl RegistrationError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicatePattern(_) => "duplicate_pattern",
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::DuplicateServer(_) => "duplicate_server",
            Self::MissingServerUrl(_) => "missing_server_url",
            Self::MissingServerToken(_) => "missing_server_token",
        }
    }
}

// ============================================================================
// Dispatch Errors (per command line)
// ============================================================================

/// Errors produced while dispatching one input line.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No registered pattern matched the line.
    #[error("command not found")]
    NotFound,

    /// The matched handler failed. Displays the handler's own message.
    #[error("{0}")]
    Handler(anyhow::Error),

    /// The matched handler panicked; the panic was caught at the dispatcher.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl DispatchError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Handler(_) => "handler_error",
            Self::Panicked(_) => "handler_panic",
        }
    }
}

/// Result type for command handlers.
///
/// Handlers may fail with any error; the dispatcher only prints its message.
pub type HandlerResult = anyhow::Result<()>;

// ============================================================================
// Config Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid server entry: {0}")]
    Registration(#[from] RegistrationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_is_stable() {
        assert_eq!(DispatchError::NotFound.to_string(), "command not found");
    }

    #[test]
    fn handler_error_displays_inner_message_only() {
        let err = DispatchError::Handler(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.to_string(), "disk on fire");
        assert_eq!(err.error_code(), "handler_error");
    }

    #[test]
    fn registration_error_codes() {
        assert_eq!(
            RegistrationError::DuplicatePattern("^a$".into()).error_code(),
            "duplicate_pattern"
        );
        assert_eq!(
            RegistrationError::MissingServerToken("main".into()).to_string(),
            "server 'main' requires a personal access token"
        );
    }
}

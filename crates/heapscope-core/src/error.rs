//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Terminal Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Terminal error: {message}")]
    Terminal { message: String },

    // ─────────────────────────────────────────────────────────────
    // Script Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Script syntax error: {message}")]
    Syntax { message: String },

    // ─────────────────────────────────────────────────────────────
    // Agent Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to reach agent: {message}")]
    Transport { message: String },

    #[error("Agent error {code}: {message}")]
    Agent { code: i32, message: String },

    #[error("Agent protocol error: {message}")]
    Protocol { message: String },

    #[error("Agent call `{method}` timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },

    #[error("Agent connection closed")]
    ChannelClosed,

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid agent URL `{url}`: {reason}")]
    InvalidAgentUrl { url: String, reason: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal {
            message: message.into(),
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn agent(code: i32, message: impl Into<String>) -> Self {
        Self::Agent {
            code,
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn timeout(method: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            method: method.into(),
            timeout_ms,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_agent_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAgentUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// True for faults raised on the far side of (or on the way to) the agent.
    pub fn is_remote_fault(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. }
                | Error::Agent { .. }
                | Error::Protocol { .. }
                | Error::Timeout { .. }
                | Error::ChannelClosed
        )
    }

    /// Check if this is a recoverable error
    ///
    /// The interactive shell keeps running after a recoverable error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Agent { .. } | Error::Protocol { .. } | Error::Timeout { .. } | Error::Json(_)
        )
    }

    /// Check if this error should trigger application exit
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. }
                | Error::ChannelClosed
                | Error::InvalidAgentUrl { .. }
                | Error::ConfigNotFound { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions (for use with color-eyre)
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}

//! Error types for the prready core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type and a process exit status.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}

impl CoreError {
    /// Process exit status for this error.
    ///
    /// Configuration problems are detected before any network activity and
    /// exit with `1`; anything that goes wrong while delivering exits with `2`.
    pub fn exit_code(&self) -> u8 {
        match self {
            CoreError::Config(_) => 1,
            CoreError::Notification(_) => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from gathering and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("{what} is required (set {var})")]
    MissingRequired { var: String, what: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// The user mapping file could not be read.
    #[error("user mapping file error at '{path}': {detail}")]
    MappingFileError { path: String, detail: String },

    /// TOML parse error when reading the user mapping file.
    #[error("user mapping parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Notification errors
// ---------------------------------------------------------------------------

/// Errors from delivering the webhook payload.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The payload could not be encoded as JSON.
    #[error("failed to encode payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Connection, TLS or timeout failure. Displays the full cause chain,
    /// e.g. `...: tcp connect error: Connection refused (os error 111)`.
    #[error("{}", error_chain(.0))]
    Transport(#[from] reqwest::Error),

    /// The webhook answered with a status of 300 or above.
    #[error("Error on message: {}{}", .status, body_suffix(.body))]
    Rejected { status: String, body: String },
}

/// `err` followed by each of its sources, joined with `": "`.
///
/// Messages a source already repeats verbatim are skipped.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

fn body_suffix(body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        String::new()
    } else {
        format!(" ({})", body)
    }
}

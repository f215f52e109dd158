//! Core error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from building or loading a machine definition.
///
/// Processing an event never produces one of these: an event that the
/// current state does not accept is an ordinary outcome, not an error.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid machine definition: initial state {state} is not declared")]
    UnknownInitialState { state: String },

    #[error("invalid machine definition: transition {state} --{event}--> {target} targets an undeclared state")]
    UnknownTarget {
        state: String,
        event: String,
        target: String,
    },

    #[error("invalid machine definition: transition on {event} leaves undeclared state {state}")]
    UnknownSource { state: String, event: String },

    #[error("invalid machine definition: transition on {event} to {target} has no source state")]
    NoSource { event: String, target: String },

    #[error("invalid machine definition: state {state} is declared more than once")]
    DuplicateState { state: String },

    #[error("invalid machine definition: state {state} declares event {event} more than once")]
    DuplicateEvent { state: String, event: String },

    #[error("invalid machine definition: action '{action}' is not registered")]
    UnknownAction { action: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CoreError {
    /// Returns whether this error comes from a malformed machine definition.
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            CoreError::UnknownInitialState { .. }
                | CoreError::UnknownTarget { .. }
                | CoreError::UnknownSource { .. }
                | CoreError::NoSource { .. }
                | CoreError::DuplicateState { .. }
                | CoreError::DuplicateEvent { .. }
                | CoreError::UnknownAction { .. }
        )
    }

    /// Returns a short, stable code for reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::UnknownInitialState { .. }
            | CoreError::UnknownTarget { .. }
            | CoreError::UnknownSource { .. }
            | CoreError::NoSource { .. }
            | CoreError::DuplicateState { .. }
            | CoreError::DuplicateEvent { .. }
            | CoreError::UnknownAction { .. } => "INVALID_DEFINITION",
            CoreError::Json(_) | CoreError::Yaml(_) => "BAD_DOCUMENT",
            CoreError::Io { .. } => "IO_ERROR",
        }
    }
}

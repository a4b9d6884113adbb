//! Error type shared by every CourseChat crate.
//!
//! Crate-local errors (for example the realtime `SessionError`) convert into
//! [`AppError`] at crate boundaries, so the binary deals with one type.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad category of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Connection, room, or record does not exist.
    NotFound,
    /// No identity is bound.
    Authentication,
    /// The bound identity may not perform the action.
    Authorization,
    /// Client input was rejected.
    Validation,
    /// The action conflicts with current state.
    Conflict,
    /// Bad or unreadable configuration.
    Configuration,
    /// JSON encoding or decoding failed.
    Serialization,
    /// Socket or file I/O failed.
    Io,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    /// Upper-case code used in logs.
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Authentication => "AUTHENTICATION",
            Self::Authorization => "AUTHORIZATION",
            Self::Validation => "VALIDATION",
            Self::Conflict => "CONFLICT",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Io => "IO",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Application error: a kind, a message, and an optional cause.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// Category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Underlying cause, if any.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Builds an error without a cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches an underlying cause.
    pub fn caused_by(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Rejected client input.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Invalid configuration.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Unexpected server-side failure.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

// The boxed source is not cloneable; clones carry kind and message only.
impl Clone for AppError {
    fn clone(&self) -> Self {
        Self::new(self.kind, self.message.clone())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorKind::Serialization, format!("Invalid JSON: {err}")).caused_by(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, err.to_string()).caused_by(err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(err.to_string()).caused_by(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = AppError::validation("room id is empty");
        assert_eq!(err.to_string(), "VALIDATION: room id is empty");
    }

    #[test]
    fn test_clone_drops_source() {
        let err = AppError::from(std::io::Error::other("disk gone"));
        assert!(err.source.is_some());

        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Io);
        assert_eq!(cloned.message, "disk gone");
        assert!(cloned.source.is_none());
    }

    #[test]
    fn test_json_errors_are_serialization() {
        let err: AppError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.kind, ErrorKind::Serialization);
    }
}

//! Unified error type and exit-code mapping.
//!
//! Only two failure classes are user-visible as a non-zero exit:
//! configuration errors (bad options, unresolvable commit) and total
//! extraction failure (no file yielded any facts). Everything else degrades:
//! mapping drops individual statements, malformed rule packs contribute
//! nothing, and validation non-conformance is reported, never fatal.

use std::fmt;

use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Stable exit codes for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BuildExitCode {
    /// Bad options or unparsable configuration; nothing was built.
    ConfigError = 2,
    /// No source yielded any facts; the build was aborted.
    ExtractionFailed = 3,
    /// Bugs and unexpected IO/serialization state.
    InternalError = 10,
}

impl BuildExitCode {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for BuildExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Canonical error type for the build pipeline.
#[derive(Debug, Error)]
pub enum OntoError {
    /// Invalid configuration; fails fast before any graph work.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Commit resolution failed (configuration class: fail fast).
    #[error("commit resolution failed: {message}")]
    Git { message: String },

    /// Zero files yielded facts; the build has nothing to publish.
    #[error("extraction produced no facts: {message}")]
    NoFacts { message: String },

    /// IO error while writing artifacts.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl OntoError {
    pub fn config(message: impl Into<String>) -> Self {
        OntoError::Config {
            message: message.into(),
        }
    }

    pub fn no_facts(message: impl Into<String>) -> Self {
        OntoError::NoFacts {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        OntoError::Internal {
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> BuildExitCode {
        BuildExitCode::from(self)
    }
}

impl From<&OntoError> for BuildExitCode {
    fn from(err: &OntoError) -> Self {
        match err {
            OntoError::Config { .. } => BuildExitCode::ConfigError,
            OntoError::Git { .. } => BuildExitCode::ConfigError,
            OntoError::NoFacts { .. } => BuildExitCode::ExtractionFailed,
            OntoError::Io(_) => BuildExitCode::InternalError,
            OntoError::Json(_) => BuildExitCode::InternalError,
            OntoError::Internal { .. } => BuildExitCode::InternalError,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod exit_code_mapping {
        use super::*;

        #[test]
        fn config_maps_to_2() {
            assert_eq!(OntoError::config("bad repo").exit_code().code(), 2);
        }

        #[test]
        fn git_is_configuration_class() {
            let err = OntoError::Git {
                message: "not a repository".to_string(),
            };
            assert_eq!(err.exit_code(), BuildExitCode::ConfigError);
        }

        #[test]
        fn no_facts_maps_to_3() {
            assert_eq!(OntoError::no_facts("all sources failed").exit_code().code(), 3);
        }

        #[test]
        fn internal_maps_to_10() {
            assert_eq!(OntoError::internal("unexpected state").exit_code().code(), 10);
        }
    }

    mod display {
        use super::*;

        #[test]
        fn config_display() {
            assert_eq!(
                OntoError::config("missing repo").to_string(),
                "configuration error: missing repo"
            );
        }
    }
}

//! Error types for templar-core.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::Violation;

/// A candidate file that could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub file: PathBuf,
    pub cause: String,
}

impl ParseFailure {
    pub fn new(file: impl Into<PathBuf>, cause: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            cause: cause.into(),
        }
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.cause)
    }
}

/// Which side of the exchange a transport failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The server rejected the submitted set. Deterministic: retrying the same
    /// request fails the same way.
    ClientError,
    /// Network, protocol, timeout or server-internal failure.
    Other,
}

/// Every way a reconciliation run can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Failure {
    /// One or more candidate files could not be parsed. Nothing is submitted.
    #[error("{} file(s) could not be parsed", .0.len())]
    Parse(Vec<ParseFailure>),

    /// Local constraint checks failed. Nothing is submitted.
    #[error("{} violation(s) found", .violations.len())]
    Validation { violations: Vec<Violation> },

    /// The reconciliation request failed.
    #[error("transport failure ({class:?}): {detail}")]
    Transport {
        class: StatusClass,
        /// HTTP status, when the server answered at all.
        code: Option<u16>,
        /// Raw server detail, surfaced verbatim for client errors.
        detail: String,
        /// Structured violations extracted from a client-error body.
        violations: Vec<Violation>,
    },
}

impl Failure {
    /// A generic transport failure with no status code.
    pub fn transport_other(detail: impl Into<String>) -> Self {
        Failure::Transport {
            class: StatusClass::Other,
            code: None,
            detail: detail.into(),
            violations: Vec::new(),
        }
    }

    /// Only non-client transport failures may succeed on a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Failure::Transport {
                class: StatusClass::Other,
                ..
            }
        )
    }
}

/// Errors raised while loading client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_other_transport_failures_are_retryable() {
        assert!(Failure::transport_other("timed out").is_retryable());
        let rejected = Failure::Transport {
            class: StatusClass::ClientError,
            code: Some(422),
            detail: "bad".into(),
            violations: vec![],
        };
        assert!(!rejected.is_retryable());
        assert!(!Failure::Parse(vec![]).is_retryable());
        assert!(!Failure::Validation { violations: vec![] }.is_retryable());
    }

    #[test]
    fn parse_failure_display_includes_path() {
        let failure = ParseFailure::new("/tmp/a.yaml", "unexpected end of stream");
        assert_eq!(failure.to_string(), "/tmp/a.yaml: unexpected end of stream");
    }

    #[test]
    fn home_not_found_error_message() {
        assert!(ConfigError::HomeNotFound.to_string().contains("home directory"));
    }
}

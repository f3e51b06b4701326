//! Translation of raw transport outcomes into [`Failure`] values.
//!
//! Pure: nothing here touches the network, so every branch is unit-testable.

use serde::Deserialize;

use templar_core::{Failure, StatusClass, Violation};

/// What went wrong on the wire, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawError {
    /// The server answered with a non-success status.
    Status { code: u16, body: String },
    /// No usable answer: connection refused, DNS, TLS, timeout.
    Transport(String),
    /// A success status whose body could not be decoded.
    Decode(String),
}

/// Statuses the server uses to reject a submitted set on its merits.
const CONSTRAINT_STATUSES: &[u16] = &[400, 422];

#[derive(Debug, Deserialize)]
struct RejectionBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    violations: Vec<RejectedField>,
}

#[derive(Debug, Deserialize)]
struct RejectedField {
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    path: Option<String>,
    message: String,
}

/// Classify a raw error.
///
/// Constraint rejections become [`StatusClass::ClientError`] with the body kept
/// verbatim as `detail` and any structured violations extracted. Everything
/// else becomes [`StatusClass::Other`].
pub fn classify(raw: RawError) -> Failure {
    match raw {
        RawError::Status { code, body } if CONSTRAINT_STATUSES.contains(&code) => {
            let violations = parse_violations(&body);
            Failure::Transport {
                class: StatusClass::ClientError,
                code: Some(code),
                detail: body,
                violations,
            }
        }
        RawError::Status { code, body } => Failure::Transport {
            class: StatusClass::Other,
            code: Some(code),
            detail: if body.trim().is_empty() {
                format!("server responded with HTTP {code}")
            } else {
                format!("server responded with HTTP {code}: {}", body.trim())
            },
            violations: Vec::new(),
        },
        RawError::Transport(detail) => Failure::transport_other(detail),
        RawError::Decode(detail) => {
            Failure::transport_other(format!("unreadable server response: {detail}"))
        }
    }
}

fn parse_violations(body: &str) -> Vec<Violation> {
    let Ok(parsed) = serde_json::from_str::<RejectionBody>(body) else {
        return Vec::new();
    };
    let mut violations: Vec<Violation> = parsed
        .violations
        .into_iter()
        .map(|v| {
            Violation::new(
                v.subject.unwrap_or_default(),
                v.path.unwrap_or_default(),
                v.message,
            )
        })
        .collect();
    if violations.is_empty() {
        if let Some(message) = parsed.message.filter(|m| !m.trim().is_empty()) {
            violations.push(Violation::new("", "", message));
        }
    }
    violations
}

use reqwest::StatusCode;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Errors raised by a completion provider.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("rate limited{}: {message}", retry_hint(.retry_after_secs))]
    RateLimited {
        retry_after_secs: Option<u64>,
        message: String,
    },

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("provider returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected completion response: {0}")]
    InvalidResponse(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(" (retry after {}s)", secs),
        None => String::new(),
    }
}

/// Coarse failure classes the front ends react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    AuthFailed,
    ApiError,
    UnknownError,
}

impl FailureKind {
    /// An auth failure cannot be fixed by resending; everything else can.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FailureKind::AuthFailed)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::RateLimited => write!(f, "rate_limited"),
            FailureKind::AuthFailed => write!(f, "auth_failed"),
            FailureKind::ApiError => write!(f, "api_error"),
            FailureKind::UnknownError => write!(f, "unknown_error"),
        }
    }
}

impl LlmError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LlmError::RateLimited { .. } => FailureKind::RateLimited,
            LlmError::AuthenticationFailed(_) => FailureKind::AuthFailed,
            LlmError::Api { .. } | LlmError::Transport(_) => FailureKind::ApiError,
            LlmError::InvalidResponse(_) | LlmError::Config(_) => FailureKind::UnknownError,
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Maps a non-success provider response onto an [`LlmError`].
///
/// `body` is the raw response text; when it carries the usual
/// `{"error": {"message": ...}}` envelope only the message is kept.
pub fn classify_status(status: StatusCode, retry_after: Option<&str>, body: &str) -> LlmError {
    let message = serde_json
        ::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("no response body").to_string()
            } else {
                body.trim().to_string()
            }
        });

    match status {
        StatusCode::TOO_MANY_REQUESTS =>
            LlmError::RateLimited {
                retry_after_secs: retry_after.and_then(|v| v.trim().parse::<u64>().ok()),
                message,
            },
        StatusCode::UNAUTHORIZED => LlmError::AuthenticationFailed(message),
        other => LlmError::Api { status: other.as_u16(), message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_requests_is_rate_limited() {
        let err = classify_status(
            StatusCode::TOO_MANY_REQUESTS,
            Some("20"),
            r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#
        );
        match &err {
            LlmError::RateLimited { retry_after_secs, message } => {
                assert_eq!(*retry_after_secs, Some(20));
                assert_eq!(message, "Rate limit reached");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.kind(), FailureKind::RateLimited);
        assert!(!err.kind().is_fatal());
        assert_eq!(err.to_string(), "rate limited (retry after 20s): Rate limit reached");
    }

    #[test]
    fn rate_limit_without_retry_after_omits_the_hint() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, Some("soon"), "slow down");
        assert_eq!(err.to_string(), "rate limited: slow down");
    }

    #[test]
    fn unauthorized_is_fatal() {
        let err = classify_status(StatusCode::UNAUTHORIZED, None, "");
        assert_eq!(err.kind(), FailureKind::AuthFailed);
        assert!(err.kind().is_fatal());
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[test]
    fn other_statuses_are_api_errors() {
        for status in [StatusCode::FORBIDDEN, StatusCode::BAD_REQUEST, StatusCode::BAD_GATEWAY] {
            let err = classify_status(status, None, "upstream exploded");
            assert_eq!(err.kind(), FailureKind::ApiError);
            assert!(err.to_string().contains("upstream exploded"));
        }
    }

    #[test]
    fn malformed_responses_are_unknown() {
        let err = LlmError::InvalidResponse("no choices".into());
        assert_eq!(err.kind(), FailureKind::UnknownError);
        assert_eq!(err.kind().to_string(), "unknown_error");
    }
}

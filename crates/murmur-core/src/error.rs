// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Murmur conversation client.

use strum::Display;
use thiserror::Error;

/// The primary error type used across all Murmur crates.
#[derive(Debug, Error)]
pub enum MurmurError {
    /// Network or transport failure (connection refused, reset, body read error).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend answered with a non-2xx status. `detail` is the response body, if any.
    #[error("request failed with status {status}: {detail}")]
    Http { status: u16, detail: String },

    /// No valid credential could be obtained.
    #[error("not logged in: {0}")]
    NotAuthenticated(String),

    /// The operation was aborted by the user.
    #[error("canceled")]
    Canceled,

    /// Input rejected client-side before anything was dispatched.
    #[error("validation error: {0}")]
    Validation(String),

    /// The entity is not in a state that allows the requested operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A multi-step workflow failed after an earlier step already took effect.
    #[error("workflow partially failed: {message}")]
    PartialWorkflow {
        message: String,
        /// Identifier of the knowledge artifact that was published before the failure.
        knowledge_id: Option<String>,
    },

    /// A response body could not be decoded.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Local cache read/write failure.
    #[error("cache error: {source}")]
    Cache {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors (invalid TOML, bad URL, missing values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A referenced entity does not exist on the client.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// The coarse error classes the UI distinguishes between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Generic failure banner; retry by re-issuing the action.
    Transport,
    /// "Not logged in"; never retried automatically.
    Authentication,
    /// User-initiated abort; informational only.
    Cancellation,
    /// Blocked before dispatch.
    Validation,
    /// Two-phase escalation answer failed after phase one.
    PartialWorkflow,
    /// Local bugs, cache and config problems.
    Internal,
}

impl MurmurError {
    /// Convenience constructor for transport failures wrapping a source error.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MurmurError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Convenience constructor for decode failures wrapping a source error.
    pub fn decode<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MurmurError::Decode {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Maps this error onto the user-facing error class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MurmurError::Transport { .. } | MurmurError::Decode { .. } => ErrorKind::Transport,
            MurmurError::Http { status, .. } if *status == 401 => ErrorKind::Authentication,
            MurmurError::Http { .. } => ErrorKind::Transport,
            MurmurError::NotAuthenticated(_) => ErrorKind::Authentication,
            MurmurError::Canceled => ErrorKind::Cancellation,
            MurmurError::Validation(_) | MurmurError::InvalidState(_) => ErrorKind::Validation,
            MurmurError::PartialWorkflow { .. } => ErrorKind::PartialWorkflow,
            MurmurError::Cache { .. }
            | MurmurError::Config(_)
            | MurmurError::NotFound { .. }
            | MurmurError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether re-issuing the same action may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let transport = MurmurError::Transport {
            message: "connection refused".into(),
            source: None,
        };
        assert_eq!(transport.kind(), ErrorKind::Transport);
        assert!(transport.is_retryable());

        let unauthorized = MurmurError::Http {
            status: 401,
            detail: "token expired".into(),
        };
        assert_eq!(unauthorized.kind(), ErrorKind::Authentication);
        assert!(!unauthorized.is_retryable());

        let server = MurmurError::Http {
            status: 503,
            detail: String::new(),
        };
        assert!(server.is_retryable());

        assert_eq!(MurmurError::Canceled.kind(), ErrorKind::Cancellation);
        assert_eq!(
            MurmurError::Validation("empty".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            MurmurError::PartialWorkflow {
                message: "mark-answered failed".into(),
                knowledge_id: Some("k1".into()),
            }
            .kind(),
            ErrorKind::PartialWorkflow
        );
        assert!(!MurmurError::NotAuthenticated("no token".into()).is_retryable());
    }

    #[test]
    fn http_error_surfaces_body_as_detail() {
        let err = MurmurError::Http {
            status: 422,
            detail: "{\"detail\":\"answer too long\"}".into(),
        };
        assert_eq!(
            err.to_string(),
            "request failed with status 422: {\"detail\":\"answer too long\"}"
        );
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::PartialWorkflow.to_string(), "partial_workflow");
        assert_eq!(ErrorKind::Authentication.to_string(), "authentication");
    }
}

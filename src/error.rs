//! Gateway error types.
//!
//! Startup failures ([`ConfigError`], [`StartupError`]) abort the process.
//! Per-connection failures ([`ProtocolError`], [`TransportError`]) end only
//! the owning session. [`StoreError`] is reported to the client as a generic
//! failure and never ends the session. [`UpgradeError`] maps to an HTTP
//! status with a structured JSON body.

use axum::extract::ws::close_code;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Structured JSON error response body.
///
/// All HTTP error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4031,
///     "message": "origin not allowed: http://evil.example"
///   }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Invalid or missing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set or is blank.
    #[error("missing required configuration: {0}")]
    Missing(&'static str),

    /// A variable is set but its value cannot be used.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Environment key.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Failure of a store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying database call failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The write went through but reported zero affected rows.
    #[error("no rows affected for key {key:?}")]
    NoRowsAffected {
        /// Key of the rejected upsert.
        key: String,
    },

    /// A non-SQL backend failed.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Fatal error raised while bringing the service up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The liveness probe against the store failed.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    /// Schema migration failed.
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The HTTP listener could not be bound or served.
    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}

/// A frame that cannot be turned into a command, or a response that cannot
/// be encoded.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The text frame is not a valid command message.
    #[error("malformed message: {0}")]
    Decode(#[source] serde_json::Error),

    /// A binary frame arrived where a JSON text frame was expected.
    #[error("expected text frame, got binary ({len} bytes)")]
    UnexpectedBinary {
        /// Payload length of the rejected frame.
        len: usize,
    },

    /// The response could not be serialized.
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ProtocolError {
    /// Close code sent to the peer when this error ends a session.
    #[must_use]
    pub const fn close_code(&self) -> u16 {
        match self {
            Self::Decode(_) => close_code::INVALID,
            Self::UnexpectedBinary { .. } => close_code::UNSUPPORTED,
            Self::Encode(_) => close_code::ERROR,
        }
    }
}

/// Socket-level failure not attributable to message decoding.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Reading the next frame failed.
    #[error("read error: {0}")]
    Read(#[source] axum::Error),

    /// Writing a frame failed.
    #[error("write error: {0}")]
    Write(#[source] axum::Error),

    /// The stream ended without a close frame.
    #[error("connection dropped without close frame")]
    Dropped,
}

/// Rejection of a WebSocket upgrade request before the handshake.
#[derive(Debug, thiserror::Error)]
pub enum UpgradeError {
    /// The request carried no usable `Origin` header.
    #[error("origin header missing")]
    OriginMissing,

    /// The `Origin` header is not in the allow-list.
    #[error("origin not allowed: {0}")]
    OriginNotAllowed(String),
}

impl UpgradeError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::OriginMissing => 4030,
            Self::OriginNotAllowed(_) => 4031,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }
}

impl IntoResponse for UpgradeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn upgrade_errors_are_forbidden() {
        let resp =
            UpgradeError::OriginNotAllowed("http://evil.example".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(UpgradeError::OriginMissing.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn protocol_errors_map_to_close_codes() {
        let decode = serde_json::from_str::<serde_json::Value>("{").err();
        let Some(decode) = decode else {
            panic!("truncated json must not parse");
        };
        assert_eq!(ProtocolError::Decode(decode).close_code(), 1007);
        assert_eq!(ProtocolError::UnexpectedBinary { len: 3 }.close_code(), 1003);
    }

    #[test]
    fn no_rows_message_names_key() {
        let err = StoreError::NoRowsAffected {
            key: "a".to_string(),
        };
        assert_eq!(err.to_string(), "no rows affected for key \"a\"");
    }
}

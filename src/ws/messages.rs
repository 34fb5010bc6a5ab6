//! WebSocket message types and their JSON codec.
//!
//! Inbound frames carry `{"action": .., "data": {"key": .., "value": ..}}`.
//! Outbound frames carry `{"status": "success" | "error", "message": ..}`.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Client → server command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Action name, matched case-sensitively.
    pub action: String,
    /// Record the action applies to.
    pub data: Record,
}

/// Key/value pair carried by a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record key.
    pub key: String,
    /// Record value.
    pub value: String,
}

/// Server → client reply; exactly one per decoded command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    /// The command was applied.
    Success {
        /// Human-readable outcome.
        message: String,
    },
    /// The command was not applied.
    Error {
        /// Human-readable outcome.
        message: String,
    },
}

impl Reply {
    /// Builds a [`Reply::Success`].
    pub fn success(message: impl Into<String>) -> Self {
        Self::Success {
            message: message.into(),
        }
    }

    /// Builds a [`Reply::Error`].
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Returns `true` for [`Reply::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The message text of either variant.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success { message } | Self::Error { message } => message,
        }
    }
}

/// Decodes one text frame into a [`Command`].
///
/// # Errors
///
/// Returns [`ProtocolError::Decode`] for invalid JSON, missing fields, or
/// fields of the wrong type.
pub fn decode_command(text: &str) -> Result<Command, ProtocolError> {
    serde_json::from_str(text).map_err(ProtocolError::Decode)
}

/// Encodes a [`Reply`] as a JSON text payload.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
pub fn encode_reply(reply: &Reply) -> Result<String, ProtocolError> {
    serde_json::to_string(reply).map_err(ProtocolError::Encode)
}

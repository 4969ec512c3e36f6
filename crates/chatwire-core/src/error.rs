//! Shared error type across chatwire crates.

use thiserror::Error;

/// Stable error codes (used in logs, UI notices, and tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Transport failed to open or was closed underneath us.
    Connection,
    /// Operation attempted while the channel is not connected.
    NotConnected,
    /// Outbound payload could not be encoded to the wire format.
    Serialization,
    /// Inbound frame did not match the wire format.
    BadFrame,
    /// Invalid configuration.
    BadConfig,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
}

impl ErrorCode {
    /// String representation used in logs and user-visible notices.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Connection => "CONNECTION_ERROR",
            ErrorCode::NotConnected => "NOT_CONNECTED",
            ErrorCode::Serialization => "SERIALIZATION_ERROR",
            ErrorCode::BadFrame => "BAD_FRAME",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ChatWireError>;

/// Unified error type used by core, client, and echo server.
#[derive(Debug, Error)]
pub enum ChatWireError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("not connected")]
    NotConnected,
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("bad frame: {0}")]
    BadFrame(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported version")]
    UnsupportedVersion,
}

impl ChatWireError {
    /// Map an error to its stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ChatWireError::Connection(_) => ErrorCode::Connection,
            ChatWireError::NotConnected => ErrorCode::NotConnected,
            ChatWireError::Serialization(_) => ErrorCode::Serialization,
            ChatWireError::BadFrame(_) => ErrorCode::BadFrame,
            ChatWireError::BadConfig(_) => ErrorCode::BadConfig,
            ChatWireError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
        }
    }
}

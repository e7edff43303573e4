//! Error types for the lnb runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the wallet bridge.
#[derive(Debug, Error)]
pub enum Error {
    /// Backend connection or session establishment failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The session has no selected account.
    #[error("No current account set")]
    NoCurrentAccount,

    /// Operation arguments violate backend limits or are malformed.
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// Payment or keysend failure (insufficient balance, routing failure).
    #[error("Payment failed: {0}")]
    Payment(String),

    /// Backend-specific method was invoked without being advertised.
    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    /// Transport-level error (the receiving context is unreachable).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Protocol-level error (malformed or uncorrelatable message).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Channel closed unexpectedly.
    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    /// Timeout waiting for operation.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Returns true if this error is transport-level - the only kind the
    /// RPC bus surfaces as a rejection instead of an error envelope.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::ChannelClosed | Error::Io(_)
        )
    }

    /// Returns true if the backend-specific capability was not advertised.
    pub fn is_unsupported_method(&self) -> bool {
        matches!(self, Error::UnsupportedMethod(_))
    }
}

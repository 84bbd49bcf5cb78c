use std::time::Duration;

use thiserror::Error;

/// Top-level error type for armgym.
#[derive(Debug, Error)]
pub enum ArmError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Invalid state: {0}")]
    State(#[from] StateError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl ArmError {
    /// Whether this error leaves the connection unusable until an explicit
    /// reconnect.
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Failures of the byte link to the simulator.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No reply from simulator within {0:?}")]
    Timeout(Duration),

    #[error("Connection closed by simulator after {received} of {expected} bytes")]
    PeerClosed { received: usize, expected: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Socket error: {0}")]
    Socket(String),
}

/// The simulator answered, but the answer makes no sense.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Invalid joint count: {0} (must be 1..=6)")]
    InvalidJointCount(usize),

    #[error("Joint count changed: detected {detected}, got {got}")]
    JointCountChanged { detected: usize, got: usize },
}

/// An operation was attempted in a lifecycle state that does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Not connected to simulator")]
    NotConnected,

    #[error("No episode in progress; call reset() first")]
    NoEpisode,

    #[error("Environment is closed")]
    Closed,
}

/// Configuration errors. Raised once at construction, never per step.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid address {address:?}: {message}")]
    InvalidAddress { address: String, message: String },

    #[error("Binding {0:?} is not available in this build")]
    BindingUnavailable(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Action validation errors.
///
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Action dimension mismatch: expected {expected}, got {got}")]
    ActionDimMismatch { expected: usize, got: usize },
}

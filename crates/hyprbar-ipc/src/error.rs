//! Error types for Hyprland IPC operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when communicating with the Hyprland compositor
#[derive(Debug, Error)]
pub enum HyprError {
    /// The HYPRLAND_INSTANCE_SIGNATURE environment variable is not set
    #[error("HYPRLAND_INSTANCE_SIGNATURE environment variable not set - is Hyprland running?")]
    SessionUnavailable,

    /// Failed to connect to one of the Hyprland sockets
    #[error("Failed to connect to Hyprland socket at {path}: {source}")]
    ConnectFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a command to Hyprland
    #[error("Failed to send command to Hyprland: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Failed to read a response or event from Hyprland
    #[error("Failed to receive data from Hyprland: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A command response exceeded the configured size limit
    #[error("Hyprland response exceeded {limit} bytes")]
    ResponseTooLarge { limit: usize },

    /// A query response could not be decoded into the expected record
    #[error("Failed to decode response to `{command}`: {source}")]
    DeserializeFailed {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// Hyprland answered an action command with something other than `ok`
    #[error("Hyprland rejected `{command}`: {message}")]
    CommandRejected { command: String, message: String },

    /// The event stream already ended and cannot be started again
    #[error("Hyprland event stream is closed")]
    StreamClosed,

    /// No monitor in the monitor list is flagged as focused
    #[error("No focused monitor found")]
    NoFocusedMonitor,
}

impl HyprError {
    /// Whether this error happened on an already established connection
    pub fn is_io_failure(&self) -> bool {
        matches!(self, HyprError::SendFailed(_) | HyprError::ReceiveFailed(_))
    }
}

//! Hyprland command channel
//!
//! Every command opens a fresh connection to `.socket.sock`, writes the
//! command verbatim, reads the reply and closes. Hyprland closes its end once
//! the reply is written, so the reply is read until EOF rather than from a
//! single bounded read; large listings therefore arrive intact. A size cap
//! keeps a misbehaving peer from growing the buffer without bound.
//!
//! No connection is reused and no retry is attempted; the wire protocol is not
//! multiplexed.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, trace};

use super::{HyprError, Session};

/// Default upper bound on a single command response (4 MiB)
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// Request/response channel to the Hyprland command socket
///
/// Holds only the socket path; each [`send`](Self::send) is independent.
#[derive(Debug, Clone)]
pub struct CommandChannel {
    socket_path: PathBuf,
    max_response_bytes: usize,
}

impl CommandChannel {
    pub fn new(session: &Session) -> Self {
        Self::with_socket_path(session.command_socket())
    }

    /// Create a channel for an explicit socket path
    pub fn with_socket_path(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    /// Override the response size limit
    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send one command and return the raw response bytes
    ///
    /// # Errors
    ///
    /// Returns `HyprError::ConnectFailure` if the socket cannot be dialed
    /// (Hyprland not running or the session is stale).
    /// Returns `HyprError::SendFailed` / `HyprError::ReceiveFailed` on I/O
    /// errors once connected.
    /// Returns `HyprError::ResponseTooLarge` if the reply exceeds the limit.
    pub async fn send(&self, command: &str) -> Result<Vec<u8>, HyprError> {
        let mut socket =
            UnixStream::connect(&self.socket_path)
                .await
                .map_err(|e| HyprError::ConnectFailure {
                    path: self.socket_path.clone(),
                    source: e,
                })?;

        socket
            .write_all(command.as_bytes())
            .await
            .map_err(HyprError::SendFailed)?;
        socket.flush().await.map_err(HyprError::SendFailed)?;

        // Read one byte past the limit so an oversized reply is detectable
        let mut response = Vec::new();
        let read_limit = (self.max_response_bytes as u64).saturating_add(1);
        (&mut socket)
            .take(read_limit)
            .read_to_end(&mut response)
            .await
            .map_err(HyprError::ReceiveFailed)?;

        if response.len() > self.max_response_bytes {
            return Err(HyprError::ResponseTooLarge {
                limit: self.max_response_bytes,
            });
        }

        debug!(command, bytes = response.len(), "Hyprland command completed");
        trace!(response = %String::from_utf8_lossy(&response), "Hyprland command response");

        Ok(response)
    }
}

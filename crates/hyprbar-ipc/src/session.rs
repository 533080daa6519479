//! Hyprland session discovery
//!
//! A running Hyprland instance is identified by its instance signature. Both
//! IPC sockets live in a per-instance directory derived from that signature:
//!
//! - `.socket.sock`  - request/response command socket
//! - `.socket2.sock` - push-only event socket

use std::path::{Path, PathBuf};

use nix::unistd::getuid;
use tracing::debug;

use super::HyprError;

/// Environment variable carrying the instance signature
pub const SIGNATURE_ENV: &str = "HYPRLAND_INSTANCE_SIGNATURE";

/// Socket root used by Hyprland releases that predate `$XDG_RUNTIME_DIR` sockets
const LEGACY_SOCKET_ROOT: &str = "/tmp/hypr";

const COMMAND_SOCKET: &str = ".socket.sock";
const EVENT_SOCKET: &str = ".socket2.sock";

/// Immutable handle on one Hyprland instance
///
/// Created once when the client is built. Holds the signature and the socket
/// directory, nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    signature: String,
    socket_dir: PathBuf,
}

impl Session {
    /// Build a session from `$HYPRLAND_INSTANCE_SIGNATURE`
    ///
    /// # Errors
    ///
    /// Returns `HyprError::SessionUnavailable` if the variable is unset or empty.
    pub fn from_env() -> Result<Self, HyprError> {
        let signature = std::env::var(SIGNATURE_ENV).map_err(|_| HyprError::SessionUnavailable)?;
        Self::new(signature)
    }

    /// Build a session for an explicit signature
    ///
    /// The socket directory is resolved from `$XDG_RUNTIME_DIR/hypr/<sig>`,
    /// then `/run/user/<uid>/hypr/<sig>`, falling back to `/tmp/hypr/<sig>`.
    pub fn new(signature: impl Into<String>) -> Result<Self, HyprError> {
        let signature = signature.into();
        if signature.is_empty() {
            return Err(HyprError::SessionUnavailable);
        }

        let socket_dir = resolve_socket_dir(&signature);
        debug!(signature = %signature, dir = %socket_dir.display(), "Resolved Hyprland socket directory");

        Ok(Self {
            signature,
            socket_dir,
        })
    }

    /// Build a session whose sockets live in `dir`
    pub fn with_socket_dir(
        signature: impl Into<String>,
        dir: impl Into<PathBuf>,
    ) -> Result<Self, HyprError> {
        let signature = signature.into();
        if signature.is_empty() {
            return Err(HyprError::SessionUnavailable);
        }

        Ok(Self {
            signature,
            socket_dir: dir.into(),
        })
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn socket_dir(&self) -> &Path {
        &self.socket_dir
    }

    /// Path of the request/response socket
    pub fn command_socket(&self) -> PathBuf {
        self.socket_dir.join(COMMAND_SOCKET)
    }

    /// Path of the event socket
    pub fn event_socket(&self) -> PathBuf {
        self.socket_dir.join(EVENT_SOCKET)
    }
}

fn resolve_socket_dir(signature: &str) -> PathBuf {
    let runtime_dirs = [
        std::env::var_os("XDG_RUNTIME_DIR").map(PathBuf::from),
        Some(PathBuf::from(format!("/run/user/{}", getuid()))),
    ];

    runtime_dirs
        .into_iter()
        .flatten()
        .map(|dir| dir.join("hypr").join(signature))
        .find(|dir| dir.is_dir())
        .unwrap_or_else(|| Path::new(LEGACY_SOCKET_ROOT).join(signature))
}

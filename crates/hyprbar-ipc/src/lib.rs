//! Hyprland IPC client for hyprbar
//!
//! This crate talks to a running Hyprland compositor over its two Unix
//! sockets. It lets a status bar:
//! - Query workspaces, windows and monitors as typed records
//! - Run `dispatch` actions (switch workspace, toggle fullscreen, ...)
//! - Follow the compositor event stream, either as raw records or through
//!   typed callbacks
//!
//! ## Architecture
//!
//! ```text
//!                      +----------------+
//!   queries/actions -> | CommandChannel | -> .socket.sock   (one connection per command)
//!                      +----------------+
//!
//!   .socket2.sock -> EventStream -> EventBus -+-> Subscription (raw Event)
//!                    (reader task)            +-> EventDispatcher -> callbacks (HyprEvent)
//! ```
//!
//! - `Session`: instance signature and socket locations
//! - `CommandChannel`: request/response over the command socket
//! - `EventStream`: background reader for the event socket
//! - `EventBus`: bounded fan-out of raw events to subscribers
//! - `EventDispatcher`: typed callbacks with bounded per-callback queues
//! - `HyprClient`: everything above for one instance, plus typed queries
//!
//! ## Protocol
//!
//! Commands are plain text; a `j/` prefix asks for JSON. Hyprland writes the
//! reply and closes the connection. Events are `TYPE>>field,field` lines.

mod bus;
mod client;
mod command;
mod dispatcher;
mod error;
mod event;
mod queries;
mod session;
mod stream;
mod typed;
mod types;

pub use bus::{EventBus, SubscriberId, Subscription, DEFAULT_SUBSCRIBER_CAPACITY};
pub use client::HyprClient;
pub use command::{CommandChannel, DEFAULT_MAX_RESPONSE_BYTES};
pub use dispatcher::{EventDispatcher, RunningDispatcher, DEFAULT_CALLBACK_QUEUE_DEPTH};
pub use error::HyprError;
pub use event::{Event, TYPE_DELIMITER};
pub use session::{Session, SIGNATURE_ENV};
pub use stream::{
    EventReaderHandle, EventStream, StreamEnd, StreamState, MAX_EVENT_RECORD_BYTES,
};
pub use typed::{DecodeError, EventKind, HyprEvent, WorkspaceRef};
pub use types::{Monitor, Window, Workspace, WorkspaceBrief};

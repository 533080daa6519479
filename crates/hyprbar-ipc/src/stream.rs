//! Hyprland event stream reader
//!
//! `.socket2.sock` is push-only: once connected, Hyprland writes one
//! `TYPE>>fields` record per line for as long as the connection stays open.
//! [`EventStream`] owns that connection; [`EventStream::spawn`] moves it onto
//! a dedicated task that parses every line and hands it to the [`EventBus`].
//!
//! ## Lifecycle
//!
//! ```text
//! Disconnected -> Connecting -> Connected (reading) -> Closed
//! ```
//!
//! `Closed` is terminal. There is no reconnect: when the compositor goes away
//! the reader stops, the connection is dropped and the bus is closed so every
//! subscriber sees end-of-stream instead of waiting forever.
//!
//! `Connecting` is published on the state channel before the socket is
//! dialed; a failed dial falls back to `Disconnected`.

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::{Event, EventBus, HyprError, Session};

/// Longest event record kept; longer lines are dropped like malformed ones
pub const MAX_EVENT_RECORD_BYTES: usize = 64 * 1024;

/// Connection state of the event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

/// Why a reader task finished without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// Hyprland closed the connection
    Eof,
    /// Shutdown was requested through the handle
    Shutdown,
}

/// Connection to the Hyprland event socket
#[derive(Debug)]
pub struct EventStream {
    reader: BufReader<UnixStream>,
    state: watch::Sender<StreamState>,
}

impl EventStream {
    /// Connect to the event socket of `session`
    ///
    /// # Errors
    ///
    /// Returns `HyprError::ConnectFailure` if the socket cannot be dialed.
    pub async fn connect(session: &Session) -> Result<Self, HyprError> {
        Self::connect_to(session.event_socket()).await
    }

    /// Connect to an explicit event socket path
    pub async fn connect_to(socket_path: impl Into<PathBuf>) -> Result<Self, HyprError> {
        let (state, _) = watch::channel(StreamState::Disconnected);
        Self::connect_reporting(socket_path.into(), state).await
    }

    /// Dial `socket_path`, publishing every transition on `state`
    pub(crate) async fn connect_reporting(
        socket_path: PathBuf,
        state: watch::Sender<StreamState>,
    ) -> Result<Self, HyprError> {
        state.send_replace(StreamState::Connecting);

        let socket = match UnixStream::connect(&socket_path).await {
            Ok(socket) => socket,
            Err(e) => {
                state.send_replace(StreamState::Disconnected);
                return Err(HyprError::ConnectFailure {
                    path: socket_path,
                    source: e,
                });
            }
        };

        state.send_replace(StreamState::Connected);
        debug!(path = %socket_path.display(), "Hyprland event stream connected");

        Ok(Self {
            reader: BufReader::new(socket),
            state,
        })
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Read the next well-formed event
    ///
    /// Lines that do not parse, or are longer than
    /// [`MAX_EVENT_RECORD_BYTES`], are dropped. Returns `Ok(None)` at EOF.
    ///
    /// # Errors
    ///
    /// Returns `HyprError::ReceiveFailed` if reading from the socket fails.
    pub async fn next_event(&mut self) -> Result<Option<Event>, HyprError> {
        let mut line = Vec::new();
        // One byte over the cap tells an oversized record from a full one
        let read_limit = MAX_EVENT_RECORD_BYTES as u64 + 1;

        loop {
            line.clear();
            let bytes_read = (&mut self.reader)
                .take(read_limit)
                .read_until(b'\n', &mut line)
                .await
                .map_err(HyprError::ReceiveFailed)?;

            if bytes_read == 0 {
                return Ok(None);
            }

            if line.len() > MAX_EVENT_RECORD_BYTES && line.last() != Some(&b'\n') {
                self.discard_line().await?;
                trace!(bytes = line.len(), "Dropping oversized event record");
                continue;
            }

            // Titles are not guaranteed to be valid UTF-8
            let text = String::from_utf8_lossy(&line);
            let record = text.strip_suffix('\n').unwrap_or(&*text);

            match Event::parse(record) {
                Some(event) => return Ok(Some(event)),
                None => trace!(record, "Dropping malformed event record"),
            }
        }
    }

    /// Skip the rest of the current line without buffering it
    async fn discard_line(&mut self) -> Result<(), HyprError> {
        loop {
            let (consumed, found) = {
                let buf = self
                    .reader
                    .fill_buf()
                    .await
                    .map_err(HyprError::ReceiveFailed)?;
                if buf.is_empty() {
                    return Ok(());
                }
                match buf.iter().position(|&b| b == b'\n') {
                    Some(end) => (end + 1, true),
                    None => (buf.len(), false),
                }
            };

            self.reader.consume(consumed);
            if found {
                return Ok(());
            }
        }
    }

/// Move the stream onto a background task feeding `bus`
    pub fn spawn(self, bus: EventBus) -> EventReaderHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let state = self.state.subscribe();
        let task = tokio::spawn(self.run(bus, shutdown_rx));

        EventReaderHandle {
            task,
            shutdown: Some(shutdown_tx),
            state,
        }
    }

    async fn run(
        mut self,
        bus: EventBus,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Result<StreamEnd, HyprError> {
        let result = loop {
            tokio::select! {
                // Fires on an explicit request and when the handle is dropped
                _ = &mut shutdown => break Ok(StreamEnd::Shutdown),
                next = self.next_event() => match next {
                    Ok(Some(event)) => {
                        let delivered = bus.dispatch(&event);
                        trace!(kind = %event.kind, delivered, "Dispatched Hyprland event");
                    }
                    Ok(None) => break Ok(StreamEnd::Eof),
                    Err(e) => break Err(e),
                },
            }
        };

        match &result {
            Ok(StreamEnd::Eof) => info!("Hyprland event stream closed by compositor"),
            Ok(StreamEnd::Shutdown) => debug!("Hyprland event stream shut down"),
            Err(e) => warn!("Hyprland event stream error: {}", e),
        }

        self.state.send_replace(StreamState::Closed);
        bus.close();

        result
    }
}

/// Handle to a running event reader task
///
/// Dropping the handle stops the reader.
#[derive(Debug)]
pub struct EventReaderHandle {
    task: JoinHandle<Result<StreamEnd, HyprError>>,
    shutdown: Option<oneshot::Sender<()>>,
    state: watch::Receiver<StreamState>,
}

impl EventReaderHandle {
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Watch channel following state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the reader to stop and wait for it
    pub async fn shutdown(mut self) -> Result<StreamEnd, HyprError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        Self::finish(self.task).await
    }

    /// Wait for the reader to stop on its own (EOF or error)
    pub async fn join(mut self) -> Result<StreamEnd, HyprError> {
        let _keep_running = self.shutdown.take();
        Self::finish(self.task).await
    }

    async fn finish(
        task: JoinHandle<Result<StreamEnd, HyprError>>,
    ) -> Result<StreamEnd, HyprError> {
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Ok(StreamEnd::Shutdown),
        }
    }
}

//! Hyprland IPC client
//!
//! [`HyprClient`] ties the pieces together for one compositor instance: the
//! [`Session`], a [`CommandChannel`] for queries and actions, one [`EventBus`]
//! and, once [`start_events`](HyprClient::start_events) has been called, the
//! background reader feeding that bus.
//!
//! Query and action helpers live in `queries.rs`.

use tokio::sync::watch;
use tracing::{debug, info};

use super::{
    CommandChannel, EventBus, EventReaderHandle, EventStream, HyprError, Session, StreamEnd,
    StreamState, SubscriberId, Subscription,
};

/// Client for one running Hyprland instance
///
/// # Example
///
/// ```ignore
/// let mut client = HyprClient::from_env()?;
/// let workspace = client.get_active_workspace().await?;
/// println!("On workspace {}", workspace.name);
///
/// let mut events = client.subscribe();
/// client.start_events().await?;
/// while let Some(event) = events.recv().await {
///     println!("{}", event);
/// }
/// ```
#[derive(Debug)]
pub struct HyprClient {
    session: Session,
    commands: CommandChannel,
    bus: EventBus,
    reader: Option<EventReaderHandle>,
    state: watch::Sender<StreamState>,
}

impl HyprClient {
    /// Build a client from `$HYPRLAND_INSTANCE_SIGNATURE`
    ///
    /// No socket is dialed here; connection errors surface on first use.
    ///
    /// # Errors
    ///
    /// Returns `HyprError::SessionUnavailable` if the signature is missing.
    pub fn from_env() -> Result<Self, HyprError> {
        Ok(Self::new(Session::from_env()?))
    }

    pub fn new(session: Session) -> Self {
        let commands = CommandChannel::new(&session);
        Self {
            session,
            commands,
            bus: EventBus::new(),
            reader: None,
            state: watch::channel(StreamState::Disconnected).0,
        }
    }

    /// Replace the command channel, e.g. to change the response size limit
    pub fn with_command_channel(mut self, commands: CommandChannel) -> Self {
        self.commands = commands;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn commands(&self) -> &CommandChannel {
        &self.commands
    }

    /// Send a raw command and return the reply bytes
    ///
    /// # Errors
    ///
    /// See [`CommandChannel::send`].
    pub async fn send_command(&self, command: &str) -> Result<Vec<u8>, HyprError> {
        self.commands.send(command).await
    }

    /// Register a new event subscriber
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    /// Remove a subscriber; unknown or already removed ids are ignored
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.bus.unsubscribe(id);
    }

    /// Connect the event socket and start the background reader
    ///
    /// Calling this again while the reader is running does nothing.
    ///
    /// # Errors
    ///
    /// Returns `HyprError::ConnectFailure` if the event socket cannot be dialed.
    /// Returns `HyprError::StreamClosed` if the stream already ended or the
    /// client was closed.
    pub async fn start_events(&mut self) -> Result<(), HyprError> {
        if self.bus.is_closed() {
            return Err(HyprError::StreamClosed);
        }
        if self.reader.is_some() {
            debug!("Hyprland event reader already running");
            return Ok(());
        }

        let stream =
            EventStream::connect_reporting(self.session.event_socket(), self.state.clone())
                .await?;
        info!(signature = %self.session.signature(), "Listening for Hyprland events");
        self.reader = Some(stream.spawn(self.bus.clone()));

        Ok(())
    }

    /// Current state of the event stream
    pub fn stream_state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Watch channel following every state transition of the event stream
    ///
    /// Taken before [`start_events`](Self::start_events), it also sees
    /// `Connecting`.
    pub fn subscribe_state(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    /// Wait until the compositor closes the event stream
    ///
    /// Returns immediately with `StreamEnd::Shutdown` if the stream was never
    /// started or was already closed.
    ///
    /// # Errors
    ///
    /// Returns `HyprError::ReceiveFailed` if the reader hit a read error.
    pub async fn wait_events(&mut self) -> Result<StreamEnd, HyprError> {
        match self.reader.take() {
            Some(reader) => reader.join().await,
            None => Ok(StreamEnd::Shutdown),
        }
    }

    /// Stop the event reader and close every subscription
    ///
    /// Safe to call more than once.
    pub async fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            match reader.shutdown().await {
                Ok(end) => debug!(?end, "Hyprland event reader stopped"),
                Err(e) => debug!("Hyprland event reader ended with error: {}", e),
            }
        }
        self.bus.close();
        self.state.send_replace(StreamState::Closed);
    }
}

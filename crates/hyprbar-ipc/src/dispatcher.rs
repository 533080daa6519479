//! Typed callback dispatch on top of the event bus
//!
//! ## Architecture
//!
//! ```text
//! +----------+   Subscription   +--------+   bounded mpsc   +-------------------+
//! | EventBus | ---------------> | router | ---------------> | callback worker 1 |
//! +----------+                  | decode |                  +-------------------+
//!                               | by kind| ---------------> | callback worker N |
//!                               +--------+                  +-------------------+
//! ```
//!
//! The router holds one bus subscription, decodes each event once and offers
//! it to every callback registered for that kind. Each callback runs on its
//! own blocking worker fed by a bounded queue, so:
//!
//! - the number of concurrent units is the number of callbacks, not the
//!   number of events;
//! - a slow callback only backs up its own queue;
//! - one callback sees events of its kind in bus order.
//!
//! A full callback queue drops that event for that callback. A panicking
//! callback is logged and keeps receiving later events.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::{
    DecodeError, EventBus, EventKind, HyprEvent, SubscriberId, Subscription, WorkspaceRef,
};

/// Events each callback may have pending before new ones are dropped for it
pub const DEFAULT_CALLBACK_QUEUE_DEPTH: usize = 64;

type Callback = Box<dyn FnMut(HyprEvent) + Send + 'static>;

struct Registration {
    kind: EventKind,
    callback: Callback,
}

/// Builder collecting typed callbacks before dispatch starts
///
/// # Example
///
/// ```ignore
/// let mut dispatcher = EventDispatcher::new();
/// dispatcher
///     .on_workspace(|ws| println!("workspace {}", ws))
///     .on_active_window(|class, title| println!("{class}: {title}"));
/// let running = dispatcher.start(client.bus());
/// ```
pub struct EventDispatcher {
    registrations: Vec<Registration>,
    queue_depth: usize,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
            queue_depth: DEFAULT_CALLBACK_QUEUE_DEPTH,
        }
    }

    /// Per-callback queue depth, clamped to what a Tokio channel accepts
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    /// Number of registered callbacks
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Register `callback` for every decoded event of `kind`
    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> &mut Self
    where
        F: FnMut(HyprEvent) + Send + 'static,
    {
        self.registrations.push(Registration {
            kind,
            callback: Box::new(callback),
        });
        self
    }

    pub fn on_workspace<F>(&mut self, mut callback: F) -> &mut Self
    where
        F: FnMut(WorkspaceRef) + Send + 'static,
    {
        self.on(EventKind::Workspace, move |event| {
            if let HyprEvent::Workspace(workspace) = event {
                callback(workspace);
            }
        })
    }

    /// Callback receives `(monitor, workspace)`
    pub fn on_focused_monitor<F>(&mut self, mut callback: F) -> &mut Self
    where
        F: FnMut(String, WorkspaceRef) + Send + 'static,
    {
        self.on(EventKind::FocusedMonitor, move |event| {
            if let HyprEvent::FocusedMonitor { monitor, workspace } = event {
                callback(monitor, workspace);
            }
        })
    }

    /// Callback receives `(class, title)`
    pub fn on_active_window<F>(&mut self, mut callback: F) -> &mut Self
    where
        F: FnMut(String, String) + Send + 'static,
    {
        self.on(EventKind::ActiveWindow, move |event| {
            if let HyprEvent::ActiveWindow { class, title } = event {
                callback(class, title);
            }
        })
    }

    pub fn on_fullscreen<F>(&mut self, mut callback: F) -> &mut Self
    where
        F: FnMut(bool) + Send + 'static,
    {
        self.on(EventKind::Fullscreen, move |event| {
            if let HyprEvent::Fullscreen(fullscreen) = event {
                callback(fullscreen);
            }
        })
    }

    /// Callback receives `(address, workspace, class, title)`
    pub fn on_window_open<F>(&mut self, mut callback: F) -> &mut Self
    where
        F: FnMut(String, WorkspaceRef, String, String) + Send + 'static,
    {
        self.on(EventKind::OpenWindow, move |event| {
            if let HyprEvent::OpenWindow {
                address,
                workspace,
                class,
                title,
            } = event
            {
                callback(address, workspace, class, title);
            }
        })
    }

    /// Callback receives the window address
    pub fn on_window_close<F>(&mut self, mut callback: F) -> &mut Self
    where
        F: FnMut(String) + Send + 'static,
    {
        self.on(EventKind::CloseWindow, move |event| {
            if let HyprEvent::CloseWindow { address } = event {
                callback(address);
            }
        })
    }

    pub fn on_workspace_create<F>(&mut self, mut callback: F) -> &mut Self
    where
        F: FnMut(WorkspaceRef) + Send + 'static,
    {
        self.on(EventKind::CreateWorkspace, move |event| {
            if let HyprEvent::CreateWorkspace(workspace) = event {
                callback(workspace);
            }
        })
    }

    pub fn on_workspace_destroy<F>(&mut self, mut callback: F) -> &mut Self
    where
        F: FnMut(WorkspaceRef) + Send + 'static,
    {
        self.on(EventKind::DestroyWorkspace, move |event| {
            if let HyprEvent::DestroyWorkspace(workspace) = event {
                callback(workspace);
            }
        })
    }

    pub fn on_submap<F>(&mut self, mut callback: F) -> &mut Self
    where
        F: FnMut(String) + Send + 'static,
    {
        self.on(EventKind::Submap, move |event| {
            if let HyprEvent::Submap(name) = event {
                callback(name);
            }
        })
    }

    /// Callback receives `(keyboard, layout)`
    pub fn on_active_layout<F>(&mut self, mut callback: F) -> &mut Self
    where
        F: FnMut(String, String) + Send + 'static,
    {
        self.on(EventKind::ActiveLayout, move |event| {
            if let HyprEvent::ActiveLayout { keyboard, layout } = event {
                callback(keyboard, layout);
            }
        })
    }

    /// Subscribe to `bus` and start routing events to the callbacks
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self, bus: &EventBus) -> RunningDispatcher {
        let subscription = bus.subscribe();
        let subscriber = subscription.id();

        let mut routes: HashMap<EventKind, Vec<CallbackQueue>> = HashMap::new();
        let mut workers = Vec::with_capacity(self.registrations.len());

        for (index, registration) in self.registrations.into_iter().enumerate() {
            let (sender, receiver) = mpsc::channel(self.queue_depth);
            let kind = registration.kind;
            let callback = registration.callback;

            workers.push(tokio::task::spawn_blocking(move || {
                run_callback(kind, index, receiver, callback)
            }));
            routes
                .entry(kind)
                .or_default()
                .push(CallbackQueue { index, sender });
        }

        debug!(subscriber = %subscriber, callbacks = workers.len(), "Event dispatcher started");
        let router = tokio::spawn(route_events(subscription, routes));

        RunningDispatcher {
            subscriber,
            router,
            workers,
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

struct CallbackQueue {
    index: usize,
    sender: mpsc::Sender<HyprEvent>,
}

async fn route_events(
    mut subscription: Subscription,
    routes: HashMap<EventKind, Vec<CallbackQueue>>,
) {
    while let Some(event) = subscription.recv().await {
        let typed = match HyprEvent::decode(&event) {
            Ok(typed) => typed,
            Err(DecodeError::Unknown(kind)) => {
                debug!(kind, "Ignoring unknown Hyprland event type");
                continue;
            }
            Err(e) => {
                debug!(error = %e, record = %event, "Ignoring malformed Hyprland event");
                continue;
            }
        };

        let Some(queues) = routes.get(&typed.kind()) else {
            continue;
        };

        for queue in queues {
            match queue.sender.try_send(typed.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(
                        kind = %typed.kind(),
                        callback = queue.index,
                        "Callback queue full, dropping event"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    trace!(callback = queue.index, "Callback worker gone");
                }
            }
        }
    }

    debug!(subscriber = %subscription.id(), "Event dispatcher stopped");
}

fn run_callback(
    kind: EventKind,
    index: usize,
    mut receiver: mpsc::Receiver<HyprEvent>,
    mut callback: Callback,
) {
    while let Some(event) = receiver.blocking_recv() {
        if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
            warn!(kind = %kind, callback = index, "Event callback panicked");
        }
    }
}

/// Handle on a started [`EventDispatcher`]
#[derive(Debug)]
pub struct RunningDispatcher {
    subscriber: SubscriberId,
    router: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl RunningDispatcher {
    /// Bus subscription feeding this dispatcher
    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber
    }

    /// Unsubscribe from `bus` and wait until every queued callback has run
    pub async fn stop(self, bus: &EventBus) {
        bus.unsubscribe(self.subscriber);
        self.join().await;
    }

    /// Wait for the dispatcher to finish on its own (bus closed)
    pub async fn join(self) {
        if let Err(e) = self.router.await {
            warn!("Event dispatcher router failed: {}", e);
        }
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!("Event callback worker failed: {}", e);
            }
        }
    }
}

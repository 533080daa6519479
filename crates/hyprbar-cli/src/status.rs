//! Status line driven by Hyprland state
//!
//! State is seeded once from queries, then kept current by typed event
//! callbacks. The line is re-rendered whenever a callback reports a change and
//! on every refresh tick, and only printed when the text actually changed.

use std::sync::{Arc, Mutex, PoisonError};

use hyprbar_config::{Colors, Config, Module};
use hyprbar_ipc::{EventDispatcher, HyprClient, HyprError, WorkspaceRef};
use miette::IntoDiagnostic;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Compositor state shown on the bar
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarState {
    pub workspace: Option<String>,
    pub fullscreen: bool,
    pub window: Option<(String, String)>,
    pub monitor: Option<String>,
    pub submap: String,
    pub layout: Option<String>,
}

type SharedState = Arc<Mutex<BarState>>;

/// Run the status line until the event stream ends or Ctrl+C
pub async fn run(mut client: HyprClient, config: &Config, colored: bool) -> miette::Result<()> {
    for module in config.modules.iter().filter(|m| !m.is_compositor()) {
        info!(module = %module, "Module has no Hyprland source, skipping");
    }

    let state: SharedState = Arc::new(Mutex::new(seed_state(&client).await?));
    let changed = Arc::new(Notify::new());

    let dispatcher = build_dispatcher(&state, &changed).start(client.bus());
    let mut ended = client.subscribe();
    client.start_events().await.into_diagnostic()?;

    let mut ticker = tokio::time::interval(config.refresh_interval);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    let mut last_line = String::new();

    loop {
        tokio::select! {
            _ = changed.notified() => {}
            _ = ticker.tick() => {}
            next = ended.recv() => {
                if next.is_none() {
                    info!("Hyprland event stream ended");
                    break;
                }
                continue;
            }
            _ = &mut interrupted => break,
        }

        let line = {
            let state = state.lock().unwrap_or_else(PoisonError::into_inner);
            render(&state, config, colored)
        };
        if line != last_line {
            println!("{}", line);
            last_line = line;
        }
    }

    client.close().await;
    dispatcher.join().await;
    Ok(())
}

async fn seed_state(client: &HyprClient) -> miette::Result<BarState> {
    let mut state = BarState::default();

    let workspace = client.get_active_workspace().await.into_diagnostic()?;
    state.fullscreen = workspace.has_fullscreen;
    state.workspace = Some(workspace.name);

    state.window = client
        .get_active_window()
        .await
        .into_diagnostic()?
        .map(|window| (window.class, window.title));

    match client.get_active_monitor().await {
        Ok(monitor) => state.monitor = Some(monitor.name),
        Err(HyprError::NoFocusedMonitor) => warn!("No focused monitor reported"),
        Err(e) => return Err(e).into_diagnostic(),
    }

    debug!(?state, "Seeded status state");
    Ok(state)
}

/// Register one callback per tracked event type
fn build_dispatcher(state: &SharedState, changed: &Arc<Notify>) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();

    dispatcher
        .on_workspace(updater(state, changed, |s, ws: WorkspaceRef| {
            s.workspace = Some(ws.name)
        }))
        .on_focused_monitor(updater2(state, changed, |s, monitor: String, ws: WorkspaceRef| {
            s.monitor = Some(monitor);
            s.workspace = Some(ws.name);
        }))
        .on_active_window(updater2(state, changed, |s, class: String, title: String| {
            s.window = (!class.is_empty() || !title.is_empty()).then_some((class, title));
        }))
        .on_fullscreen(updater(state, changed, |s, on: bool| s.fullscreen = on))
        .on_submap(updater(state, changed, |s, name: String| s.submap = name))
        .on_active_layout(updater2(state, changed, |s, _keyboard: String, layout: String| {
            s.layout = Some(layout)
        }));

    dispatcher
}

fn updater<T>(
    state: &SharedState,
    changed: &Arc<Notify>,
    apply: impl Fn(&mut BarState, T) + Send + 'static,
) -> impl FnMut(T) + Send + 'static {
    let (state, changed) = (state.clone(), changed.clone());
    move |value| {
        apply(&mut state.lock().unwrap_or_else(PoisonError::into_inner), value);
        changed.notify_one();
    }
}

fn updater2<A, B>(
    state: &SharedState,
    changed: &Arc<Notify>,
    apply: impl Fn(&mut BarState, A, B) + Send + 'static,
) -> impl FnMut(A, B) + Send + 'static {
    let (state, changed) = (state.clone(), changed.clone());
    move |a, b| {
        apply(&mut state.lock().unwrap_or_else(PoisonError::into_inner), a, b);
        changed.notify_one();
    }
}

/// Render the modules in configured order; empty modules are left out
pub fn render(state: &BarState, config: &Config, colored: bool) -> String {
    let paint = Painter::new(&config.colors, colored);

    config
        .modules
        .iter()
        .filter_map(|module| render_module(module, state, &paint))
        .collect::<Vec<_>>()
        .join(&config.separator)
}

fn render_module(module: &Module, state: &BarState, paint: &Painter) -> Option<String> {
    match module {
        Module::Workspaces => state.workspace.as_ref().map(|name| {
            let marker = if state.fullscreen { " [F]" } else { "" };
            paint.primary(&format!("{}{}", name, marker))
        }),
        Module::Window => state.window.as_ref().map(|(class, title)| {
            if title.is_empty() {
                paint.text(class)
            } else {
                paint.text(&format!("{}: {}", class, title))
            }
        }),
        Module::Monitor => state.monitor.as_deref().map(|name| paint.text(name)),
        Module::Submap => (!state.submap.is_empty()).then(|| paint.primary(&state.submap)),
        Module::Layout => state.layout.as_deref().map(|layout| paint.text(layout)),
        Module::External(_) => None,
    }
}

/// ANSI truecolor foregrounds for the configured palette
struct Painter {
    primary: Option<(u8, u8, u8)>,
    text: Option<(u8, u8, u8)>,
}

impl Painter {
    fn new(colors: &Colors, enabled: bool) -> Self {
        let pick = |hex: &str| enabled.then(|| parse_rgb(hex)).flatten();
        Self {
            primary: pick(&colors.primary),
            text: pick(&colors.text),
        }
    }

    fn primary(&self, value: &str) -> String {
        paint(self.primary, value)
    }

    fn text(&self, value: &str) -> String {
        paint(self.text, value)
    }
}

fn paint(color: Option<(u8, u8, u8)>, value: &str) -> String {
    match color {
        Some((r, g, b)) => format!("\x1b[38;2;{};{};{}m{}\x1b[0m", r, g, b, value),
        None => value.to_string(),
    }
}

/// `#RRGGBB` (alpha ignored) to components
fn parse_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

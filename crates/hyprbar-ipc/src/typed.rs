//! Typed decoding of the Hyprland events this crate understands
//!
//! [`EventKind`] is the closed set of recognised event types and
//! [`HyprEvent`] has one variant per kind. Anything else decodes to
//! [`DecodeError::Unknown`] so protocol drift shows up in the logs instead of
//! vanishing.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::Event;

/// Recognised Hyprland event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Workspace,
    FocusedMonitor,
    ActiveWindow,
    Fullscreen,
    MonitorRemoved,
    MonitorAdded,
    CreateWorkspace,
    DestroyWorkspace,
    MoveWorkspace,
    ActiveLayout,
    OpenWindow,
    CloseWindow,
    MoveWindow,
    OpenLayer,
    CloseLayer,
    Submap,
}

impl EventKind {
    pub const ALL: [EventKind; 16] = [
        EventKind::Workspace,
        EventKind::FocusedMonitor,
        EventKind::ActiveWindow,
        EventKind::Fullscreen,
        EventKind::MonitorRemoved,
        EventKind::MonitorAdded,
        EventKind::CreateWorkspace,
        EventKind::DestroyWorkspace,
        EventKind::MoveWorkspace,
        EventKind::ActiveLayout,
        EventKind::OpenWindow,
        EventKind::CloseWindow,
        EventKind::MoveWindow,
        EventKind::OpenLayer,
        EventKind::CloseLayer,
        EventKind::Submap,
    ];

    /// Wire name of the event type
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Workspace => "workspace",
            EventKind::FocusedMonitor => "focusedmon",
            EventKind::ActiveWindow => "activewindow",
            EventKind::Fullscreen => "fullscreen",
            EventKind::MonitorRemoved => "monitorremoved",
            EventKind::MonitorAdded => "monitoradded",
            EventKind::CreateWorkspace => "createworkspace",
            EventKind::DestroyWorkspace => "destroyworkspace",
            EventKind::MoveWorkspace => "moveworkspace",
            EventKind::ActiveLayout => "activelayout",
            EventKind::OpenWindow => "openwindow",
            EventKind::CloseWindow => "closewindow",
            EventKind::MoveWindow => "movewindow",
            EventKind::OpenLayer => "openlayer",
            EventKind::CloseLayer => "closelayer",
            EventKind::Submap => "submap",
        }
    }

    /// Number of fields the kind carries on the wire
    fn arity(self) -> usize {
        match self {
            EventKind::OpenWindow => 4,
            EventKind::FocusedMonitor
            | EventKind::ActiveWindow
            | EventKind::MoveWorkspace
            | EventKind::ActiveLayout
            | EventKind::MoveWindow => 2,
            _ => 1,
        }
    }

    /// Whether the last field is free-form text that may contain commas
    fn has_free_form_tail(self) -> bool {
        matches!(
            self,
            EventKind::ActiveWindow | EventKind::OpenWindow | EventKind::ActiveLayout
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DecodeError::Unknown(s.to_string()))
    }
}

/// Why an event could not be turned into a [`HyprEvent`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown event type `{0}`")]
    Unknown(String),

    #[error("`{kind}` event needs {expected} field(s), found {found}")]
    MissingFields {
        kind: EventKind,
        expected: usize,
        found: usize,
    },
}

/// A workspace as named in an event field
///
/// `id` is set when the field is numeric; `name` always holds the raw field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceRef {
    pub id: Option<i64>,
    pub name: String,
}

impl WorkspaceRef {
    pub fn parse(field: &str) -> Self {
        Self {
            id: field.parse().ok(),
            name: field.to_string(),
        }
    }
}

impl fmt::Display for WorkspaceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Decoded Hyprland event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HyprEvent {
    /// Active workspace changed
    Workspace(WorkspaceRef),
    /// Focus moved to another monitor
    FocusedMonitor { monitor: String, workspace: WorkspaceRef },
    /// Active window changed; both fields are empty when nothing is focused
    ActiveWindow { class: String, title: String },
    /// Fullscreen state of the active window changed
    Fullscreen(bool),
    MonitorRemoved(String),
    MonitorAdded(String),
    CreateWorkspace(WorkspaceRef),
    DestroyWorkspace(WorkspaceRef),
    /// A workspace moved to another monitor
    MoveWorkspace { workspace: WorkspaceRef, monitor: String },
    /// Keyboard layout switched
    ActiveLayout { keyboard: String, layout: String },
    OpenWindow {
        address: String,
        workspace: WorkspaceRef,
        class: String,
        title: String,
    },
    CloseWindow { address: String },
    /// A window moved to another workspace
    MoveWindow { address: String, workspace: WorkspaceRef },
    /// A layer surface (bar, notification, ...) was mapped
    OpenLayer(String),
    CloseLayer(String),
    /// Keybind submap changed; empty when returning to the default map
    Submap(String),
}

impl HyprEvent {
    /// Decode a generic event into its typed form
    pub fn decode(event: &Event) -> Result<Self, DecodeError> {
        let kind: EventKind = event.kind.parse()?;
        let fields = fields_for(kind, &event.fields)?;
        let text = |i: usize| fields[i].clone();
        let workspace = |i: usize| WorkspaceRef::parse(&fields[i]);

        let decoded = match kind {
            EventKind::Workspace => HyprEvent::Workspace(workspace(0)),
            EventKind::FocusedMonitor => HyprEvent::FocusedMonitor {
                monitor: text(0),
                workspace: workspace(1),
            },
            EventKind::ActiveWindow => HyprEvent::ActiveWindow {
                class: text(0),
                title: text(1),
            },
            EventKind::Fullscreen => HyprEvent::Fullscreen(fields[0] == "1"),
            EventKind::MonitorRemoved => HyprEvent::MonitorRemoved(text(0)),
            EventKind::MonitorAdded => HyprEvent::MonitorAdded(text(0)),
            EventKind::CreateWorkspace => HyprEvent::CreateWorkspace(workspace(0)),
            EventKind::DestroyWorkspace => HyprEvent::DestroyWorkspace(workspace(0)),
            EventKind::MoveWorkspace => HyprEvent::MoveWorkspace {
                workspace: workspace(0),
                monitor: text(1),
            },
            EventKind::ActiveLayout => HyprEvent::ActiveLayout {
                keyboard: text(0),
                layout: text(1),
            },
            EventKind::OpenWindow => HyprEvent::OpenWindow {
                address: text(0),
                workspace: workspace(1),
                class: text(2),
                title: text(3),
            },
            EventKind::CloseWindow => HyprEvent::CloseWindow { address: text(0) },
            EventKind::MoveWindow => HyprEvent::MoveWindow {
                address: text(0),
                workspace: workspace(1),
            },
            EventKind::OpenLayer => HyprEvent::OpenLayer(text(0)),
            EventKind::CloseLayer => HyprEvent::CloseLayer(text(0)),
            EventKind::Submap => HyprEvent::Submap(text(0)),
        };

        Ok(decoded)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            HyprEvent::Workspace(_) => EventKind::Workspace,
            HyprEvent::FocusedMonitor { .. } => EventKind::FocusedMonitor,
            HyprEvent::ActiveWindow { .. } => EventKind::ActiveWindow,
            HyprEvent::Fullscreen(_) => EventKind::Fullscreen,
            HyprEvent::MonitorRemoved(_) => EventKind::MonitorRemoved,
            HyprEvent::MonitorAdded(_) => EventKind::MonitorAdded,
            HyprEvent::CreateWorkspace(_) => EventKind::CreateWorkspace,
            HyprEvent::DestroyWorkspace(_) => EventKind::DestroyWorkspace,
            HyprEvent::MoveWorkspace { .. } => EventKind::MoveWorkspace,
            HyprEvent::ActiveLayout { .. } => EventKind::ActiveLayout,
            HyprEvent::OpenWindow { .. } => EventKind::OpenWindow,
            HyprEvent::CloseWindow { .. } => EventKind::CloseWindow,
            HyprEvent::MoveWindow { .. } => EventKind::MoveWindow,
            HyprEvent::OpenLayer(_) => EventKind::OpenLayer,
            HyprEvent::CloseLayer(_) => EventKind::CloseLayer,
            HyprEvent::Submap(_) => EventKind::Submap,
        }
    }
}

/// Shape the raw split into exactly `kind.arity()` fields
///
/// Kinds ending in free-form text get surplus pieces joined back into the
/// last field. For every other kind surplus pieces are ignored.
fn fields_for(kind: EventKind, raw: &[String]) -> Result<Vec<String>, DecodeError> {
    let arity = kind.arity();
    if raw.len() < arity {
        return Err(DecodeError::MissingFields {
            kind,
            expected: arity,
            found: raw.len(),
        });
    }

    if raw.len() > arity {
        debug!(
            kind = %kind,
            expected = arity,
            found = raw.len(),
            "Event carries more comma-separated pieces than its type declares"
        );
    }

    let mut fields: Vec<String> = raw[..arity].to_vec();
    if kind.has_free_form_tail() && raw.len() > arity {
        fields[arity - 1] = raw[arity - 1..].join(",");
    }

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(line: &str) -> Result<HyprEvent, DecodeError> {
        HyprEvent::decode(&Event::parse(line).unwrap())
    }

    #[test]
    fn test_every_kind_round_trips_its_wire_name() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_numeric_workspace_has_id() {
        assert_eq!(
            decode("workspace>>3").unwrap(),
            HyprEvent::Workspace(WorkspaceRef {
                id: Some(3),
                name: "3".to_string()
            })
        );
    }

    #[test]
    fn test_named_workspace_falls_back_to_name() {
        let HyprEvent::Workspace(ws) = decode("workspace>>special:scratch").unwrap() else {
            panic!("expected workspace event");
        };
        assert_eq!(ws.id, None);
        assert_eq!(ws.name, "special:scratch");
    }

    #[test]
    fn test_active_window_title_keeps_commas() {
        assert_eq!(
            decode("activewindow>>firefox,Hello, world - Mozilla Firefox").unwrap(),
            HyprEvent::ActiveWindow {
                class: "firefox".to_string(),
                title: "Hello, world - Mozilla Firefox".to_string(),
            }
        );
    }

    #[test]
    fn test_active_window_cleared() {
        assert_eq!(
            decode("activewindow>>,").unwrap(),
            HyprEvent::ActiveWindow {
                class: String::new(),
                title: String::new(),
            }
        );
    }

    #[test]
    fn test_open_window_four_fields() {
        assert_eq!(
            decode("openwindow>>80e62df0,2,kitty,~/src, the repo").unwrap(),
            HyprEvent::OpenWindow {
                address: "80e62df0".to_string(),
                workspace: WorkspaceRef::parse("2"),
                class: "kitty".to_string(),
                title: "~/src, the repo".to_string(),
            }
        );
    }

    #[test]
    fn test_fullscreen_flag() {
        assert_eq!(decode("fullscreen>>1").unwrap(), HyprEvent::Fullscreen(true));
        assert_eq!(decode("fullscreen>>0").unwrap(), HyprEvent::Fullscreen(false));
    }

    #[test]
    fn test_two_field_kinds() {
        assert_eq!(
            decode("focusedmon>>DP-1,4").unwrap(),
            HyprEvent::FocusedMonitor {
                monitor: "DP-1".to_string(),
                workspace: WorkspaceRef::parse("4"),
            }
        );
        assert_eq!(
            decode("moveworkspace>>web,HDMI-A-1").unwrap(),
            HyprEvent::MoveWorkspace {
                workspace: WorkspaceRef::parse("web"),
                monitor: "HDMI-A-1".to_string(),
            }
        );
        assert_eq!(
            decode("movewindow>>80e62df0,5").unwrap(),
            HyprEvent::MoveWindow {
                address: "80e62df0".to_string(),
                workspace: WorkspaceRef::parse("5"),
            }
        );
        assert_eq!(
            decode("activelayout>>at-translated-set-2-keyboard,English (US)").unwrap(),
            HyprEvent::ActiveLayout {
                keyboard: "at-translated-set-2-keyboard".to_string(),
                layout: "English (US)".to_string(),
            }
        );
    }

    #[test]
    fn test_single_field_kinds() {
        assert_eq!(
            decode("monitoradded>>HDMI-A-1").unwrap(),
            HyprEvent::MonitorAdded("HDMI-A-1".to_string())
        );
        assert_eq!(
            decode("monitorremoved>>HDMI-A-1").unwrap(),
            HyprEvent::MonitorRemoved("HDMI-A-1".to_string())
        );
        assert_eq!(
            decode("createworkspace>>7").unwrap(),
            HyprEvent::CreateWorkspace(WorkspaceRef::parse("7"))
        );
        assert_eq!(
            decode("destroyworkspace>>7").unwrap(),
            HyprEvent::DestroyWorkspace(WorkspaceRef::parse("7"))
        );
        assert_eq!(
            decode("closewindow>>80e62df0").unwrap(),
            HyprEvent::CloseWindow {
                address: "80e62df0".to_string()
            }
        );
        assert_eq!(
            decode("openlayer>>notifications").unwrap(),
            HyprEvent::OpenLayer("notifications".to_string())
        );
        assert_eq!(
            decode("closelayer>>notifications").unwrap(),
            HyprEvent::CloseLayer("notifications".to_string())
        );
        assert_eq!(decode("submap>>").unwrap(), HyprEvent::Submap(String::new()));
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(
            decode("windowtitle>>80e62df0").unwrap_err(),
            DecodeError::Unknown("windowtitle".to_string())
        );
    }

    #[test]
    fn test_missing_fields() {
        assert_eq!(
            decode("openwindow>>80e62df0,2").unwrap_err(),
            DecodeError::MissingFields {
                kind: EventKind::OpenWindow,
                expected: 4,
                found: 2,
            }
        );
    }

    #[test]
    fn test_decoded_kind_matches_wire_kind() {
        let event = decode("movewindow>>80e62df0,5").unwrap();
        assert_eq!(event.kind(), EventKind::MoveWindow);
    }
}

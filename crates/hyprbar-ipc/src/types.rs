//! Records returned by Hyprland JSON queries
//!
//! These mirror the objects Hyprland prints for the `j/` queries, keeping only
//! the fields a status bar uses. Every field has a default so that older or
//! newer compositor releases that add or drop keys still decode.
//!
//! All records also serialize, which is how the CLI prints them.

use serde::{Deserialize, Deserializer, Serialize};

/// Workspace reference embedded in windows and monitors
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceBrief {
    pub id: i64,
    pub name: String,
}

/// One workspace, from `j/workspaces` or `j/activeworkspace`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workspace {
    pub id: i64,
    pub name: String,

    /// Name of the monitor showing this workspace
    pub monitor: String,

    #[serde(rename = "monitorID")]
    pub monitor_id: i64,

    /// Number of windows on the workspace
    pub windows: u32,

    #[serde(rename = "hasfullscreen")]
    pub has_fullscreen: bool,

    /// Address of the last focused window, e.g. `0x55d1c5a4e0f0`
    #[serde(rename = "lastwindow")]
    pub last_window: String,

    #[serde(rename = "lastwindowtitle")]
    pub last_window_title: String,
}

/// One client window, from `j/clients` or `j/activewindow`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Window {
    pub address: String,
    pub class: String,
    pub title: String,
    pub workspace: WorkspaceBrief,

    /// Monitor id the window is on
    pub monitor: i64,

    /// Hyprland reports either a bool or a fullscreen mode number
    #[serde(deserialize_with = "bool_or_mode")]
    pub fullscreen: bool,

    pub floating: bool,
    pub pinned: bool,
    pub at: [i32; 2],
    pub size: [i32; 2],
}

/// One output, from `j/monitors`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Monitor {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub make: String,
    pub model: String,
    pub serial: String,
    pub width: u32,
    pub height: u32,

    #[serde(rename = "refreshRate")]
    pub refresh_rate: f64,

    pub x: i32,
    pub y: i32,

    #[serde(rename = "activeWorkspace")]
    pub active_workspace: WorkspaceBrief,

    pub reserved: [i32; 4],
    pub scale: f64,
    pub transform: i32,

    /// Whether this monitor has input focus
    pub focused: bool,

    #[serde(rename = "dpmsStatus")]
    pub dpms_status: bool,

    pub vrr: bool,
}

/// Accept `true`/`false` as well as integer fullscreen modes (non-zero is on)
fn bool_or_mode<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Mode(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(on) => on,
        Flag::Mode(mode) => mode != 0,
    })
}

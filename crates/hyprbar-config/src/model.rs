//! Configuration data model

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// How often the status line is redrawn even without events
    #[serde(serialize_with = "duration_secs")]
    pub refresh_interval: Duration,
    pub log_level: LogLevel,
    /// Modules in display order
    pub modules: Vec<Module>,
    pub colors: Colors,
    /// Text placed between rendered modules
    pub separator: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(1),
            log_level: LogLevel::Info,
            modules: ["workspaces", "window", "clock", "cpu", "memory", "battery"]
                .into_iter()
                .map(Module::from_name)
                .collect(),
            colors: Colors::default(),
            separator: " | ".to_string(),
        }
    }
}

/// Palette as `#RRGGBB` (or `#RRGGBBAA`) strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Colors {
    pub primary: String,
    pub surface: String,
    pub text: String,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            primary: "#D7BAFF".to_string(),
            surface: "#16121B".to_string(),
            text: "#E9DFEE".to_string(),
        }
    }
}

/// One status bar module
///
/// The compositor-backed modules are rendered from Hyprland state. Anything
/// else (clock, cpu, battery, ...) is kept by name for other providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Module {
    /// Active workspace
    Workspaces,
    /// Focused window class and title
    Window,
    /// Focused monitor
    Monitor,
    /// Current keybind submap
    Submap,
    /// Active keyboard layout
    Layout,
    External(String),
}

impl Module {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "workspaces" | "workspace" => Self::Workspaces,
            "window" => Self::Window,
            "monitor" => Self::Monitor,
            "submap" => Self::Submap,
            "layout" => Self::Layout,
            _ => Self::External(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Workspaces => "workspaces",
            Self::Window => "window",
            Self::Monitor => "monitor",
            Self::Submap => "submap",
            Self::Layout => "layout",
            Self::External(name) => name,
        }
    }

    /// Whether the module is fed by the compositor
    pub fn is_compositor(&self) -> bool {
        !matches!(self, Self::External(_))
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Module {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

fn duration_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

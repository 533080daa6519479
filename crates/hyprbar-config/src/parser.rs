//! KDL configuration parser

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::model::*;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/hyprbar/config.kdl";

/// Default configuration path with `~` expanded
pub fn default_config_path() -> PathBuf {
    shellexpand::tilde(DEFAULT_CONFIG_PATH).into_owned().into()
}

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse `path`, or return the default configuration if it does not exist
///
/// A file that exists but fails to parse is still an error.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(Config::default());
    }

    parse_config(path)
}

/// Parse configuration from a string
///
/// Nodes that are absent keep their default value.
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl reports spans with its own miette version; rebuild from offset/len
        let span = miette::SourceSpan::from((e.span.offset(), e.span.len()));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();

    for node in doc.nodes() {
        match node.name().value() {
            "refresh-interval" => {
                config.refresh_interval = parse_refresh_interval(node)?;
            }
            "log-level" => {
                config.log_level = string_arg(node)?
                    .parse()
                    .map_err(|e| ConfigError::Invalid { message: e })?;
            }
            "modules" => {
                config.modules = parse_modules(node)?;
            }
            "colors" => {
                config.colors = parse_colors(node)?;
            }
            "separator" => {
                config.separator = string_arg(node)?.to_string();
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    Ok(config)
}

/// First positional argument of `node` as a string
fn string_arg(node: &kdl::KdlNode) -> Result<&str, ConfigError> {
    let field = node.name().value();
    let entry = positional(node).next().ok_or_else(|| ConfigError::MissingValue {
        field: field.to_string(),
    })?;

    entry.value().as_string().ok_or_else(|| ConfigError::Invalid {
        message: format!("`{}` expects a string, got {}", field, entry.value()),
    })
}

fn positional(node: &kdl::KdlNode) -> impl Iterator<Item = &kdl::KdlEntry> {
    node.entries().iter().filter(|entry| entry.name().is_none())
}

fn parse_refresh_interval(node: &kdl::KdlNode) -> Result<Duration, ConfigError> {
    let entry = positional(node).next().ok_or_else(|| ConfigError::MissingValue {
        field: "refresh-interval".to_string(),
    })?;

    let seconds = match (entry.value().as_i64(), entry.value().as_f64()) {
        (Some(whole), _) => whole as f64,
        (None, Some(fraction)) => fraction,
        (None, None) => {
            return Err(ConfigError::Invalid {
                message: format!(
                    "`refresh-interval` expects a number of seconds, got {}",
                    entry.value()
                ),
            })
        }
    };

    let interval = Duration::try_from_secs_f64(seconds).map_err(|e| ConfigError::Invalid {
        message: format!("`refresh-interval` {} is out of range: {}", seconds, e),
    })?;

    // Also catches values too small to survive as nanoseconds
    if interval.is_zero() {
        return Err(ConfigError::Invalid {
            message: format!("`refresh-interval` must be positive, got {}", seconds),
        });
    }

    Ok(interval)
}

fn parse_modules(node: &kdl::KdlNode) -> Result<Vec<Module>, ConfigError> {
    let mut modules = Vec::new();

    for entry in positional(node) {
        let name = entry.value().as_string().ok_or_else(|| ConfigError::Invalid {
            message: format!("Module names must be strings, got {}", entry.value()),
        })?;

        let module = Module::from_name(name);
        if modules.contains(&module) {
            tracing::warn!("Module listed twice: {}", name);
            continue;
        }
        modules.push(module);
    }

    Ok(modules)
}

fn parse_colors(node: &kdl::KdlNode) -> Result<Colors, ConfigError> {
    let mut colors = Colors::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let slot = match child.name().value() {
                "primary" => &mut colors.primary,
                "surface" => &mut colors.surface,
                "text" => &mut colors.text,
                name => {
                    tracing::warn!("Unknown color: {}", name);
                    continue;
                }
            };

            let value = string_arg(child)?;
            if !is_hex_color(value) {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "Color `{}` must look like #RRGGBB, got {:?}",
                        child.name().value(),
                        value
                    ),
                });
            }
            *slot = value.to_string();
        }
    }

    Ok(colors)
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

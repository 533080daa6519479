//! Configuration parsing for hyprbar
//!
//! This crate reads the KDL configuration file that controls which modules
//! the status bar shows, how often it refreshes and which colors it uses.

mod error;
mod model;
mod parser;

pub use error::ConfigError;
pub use model::*;
pub use parser::{
    default_config_path, load_or_default, parse_config, parse_config_str, DEFAULT_CONFIG_PATH,
};

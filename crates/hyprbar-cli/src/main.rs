//! hyprbar CLI
//!
//! Status line and query tool for Hyprland.

mod status;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use hyprbar_config::{Config, LogLevel};
use hyprbar_ipc::{EventKind, HyprClient, HyprEvent};
use miette::IntoDiagnostic;
use serde::Serialize;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hyprbar")]
#[command(about = "Status line and IPC tool for Hyprland")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = hyprbar_config::DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration file
    Validate {
        /// Print the effective configuration as JSON
        #[arg(long)]
        json: bool,
    },

    /// List workspaces
    Workspaces,

    /// List client windows
    Windows,

    /// List monitors
    Monitors,

    /// Show the active workspace
    ActiveWorkspace,

    /// Show the focused window
    ActiveWindow,

    /// Show the focused monitor
    ActiveMonitor,

    /// Switch to a workspace by id or name
    Switch { workspace: String },

    /// Run a Hyprland dispatcher
    Dispatch {
        action: String,
        args: Vec<String>,
    },

    /// Send a raw command and print the reply
    Raw { command: String },

    /// Print compositor events as they arrive
    Watch {
        /// Only show these event types (decoded)
        #[arg(short, long)]
        kind: Vec<String>,
    },

    /// Run the status line
    Status {
        /// Disable ANSI colors
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();

    if let Commands::Validate { json } = cli.command {
        init_tracing(LogLevel::Warn);
        return cmd_validate(&config_path, json);
    }

    let config = hyprbar_config::load_or_default(&config_path)?;

    // One-shot commands stay quiet unless RUST_LOG says otherwise
    let level = match cli.command {
        Commands::Watch { .. } | Commands::Status { .. } => config.log_level,
        _ => LogLevel::Warn,
    };
    init_tracing(level);

    let client = HyprClient::from_env().into_diagnostic()?;

    match cli.command {
        Commands::Validate { .. } => Ok(()),
        Commands::Workspaces => print_json(&client.get_workspaces().await.into_diagnostic()?),
        Commands::Windows => print_json(&client.get_windows().await.into_diagnostic()?),
        Commands::Monitors => print_json(&client.get_monitors().await.into_diagnostic()?),
        Commands::ActiveWorkspace => {
            print_json(&client.get_active_workspace().await.into_diagnostic()?)
        }
        Commands::ActiveWindow => print_json(&client.get_active_window().await.into_diagnostic()?),
        Commands::ActiveMonitor => {
            print_json(&client.get_active_monitor().await.into_diagnostic()?)
        }
        Commands::Switch { workspace } => cmd_switch(&client, &workspace).await,
        Commands::Dispatch { action, args } => client
            .dispatch(&action, &args.join(" "))
            .await
            .into_diagnostic(),
        Commands::Raw { command } => {
            let reply = client.send_command(&command).await.into_diagnostic()?;
            println!("{}", String::from_utf8_lossy(&reply).trim_end());
            Ok(())
        }
        Commands::Watch { kind } => cmd_watch(client, &kind).await,
        Commands::Status { plain } => status::run(client, &config, !plain).await,
    }
}

/// Log to stderr so stdout only carries command output
fn init_tracing(default_level: LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter())),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> miette::Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

fn cmd_validate(config_path: &Path, json: bool) -> miette::Result<()> {
    let config = hyprbar_config::parse_config(config_path)?;

    if json {
        return print_json(&config);
    }

    println!("Validating configuration: {}", config_path.display());
    println!("Configuration is valid!");
    print_summary(&config);
    Ok(())
}

fn print_summary(config: &Config) {
    println!(
        "  Refresh interval: {:.1}s",
        config.refresh_interval.as_secs_f64()
    );
    println!("  Log level: {}", config.log_level.as_filter());
    println!("  Modules: {}", config.modules.len());
    for module in &config.modules {
        let source = if module.is_compositor() {
            "hyprland"
        } else {
            "external"
        };
        println!("    - {} ({})", module, source);
    }
}

async fn cmd_switch(client: &HyprClient, workspace: &str) -> miette::Result<()> {
    let result = match workspace.parse::<i64>() {
        Ok(id) => client.switch_workspace(id).await,
        Err(_) => client.switch_workspace_by_name(workspace).await,
    };
    result.into_diagnostic()
}

async fn cmd_watch(mut client: HyprClient, kinds: &[String]) -> miette::Result<()> {
    let kinds = kinds
        .iter()
        .map(|name| name.parse::<EventKind>())
        .collect::<Result<Vec<_>, _>>()
        .into_diagnostic()?;

    let mut events = client.subscribe();
    client.start_events().await.into_diagnostic()?;

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            next = events.next() => {
                let Some(event) = next else {
                    tracing::info!("Hyprland event stream ended");
                    break;
                };

                if kinds.is_empty() {
                    println!("{}", event);
                    continue;
                }

                match HyprEvent::decode(&event) {
                    Ok(typed) if kinds.contains(&typed.kind()) => println!("{:?}", typed),
                    Ok(_) => {}
                    Err(e) => tracing::debug!("Skipping event: {}", e),
                }
            }
            _ = &mut interrupted => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    client.close().await;
    Ok(())
}

//! Telemon - Live system telemetry dashboard for your terminal
//!
//! Polls a remote monitoring API for per-system stats and process lists,
//! keeps a short rolling history per view, and renders it as cards, charts
//! and tables. Users can also send shell commands to a monitored system and
//! read back their output.

mod commands;
mod config;
mod core;
mod integrations;
mod telemetry;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::core::app::App;
use crate::core::state::Session;
use crate::integrations::api::{ApiClient, TelemetryApi};
use crate::telemetry::{PollContext, TelemetryAggregator};
use crate::ui::theme::Theme;

#[derive(Parser)]
#[command(name = "telemon")]
#[command(author = "Telemon Contributors")]
#[command(version)]
#[command(about = "Live system telemetry dashboard for your terminal", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// API host (overrides the config file)
    #[arg(long, env = "TELEMON_HOST", value_name = "HOST")]
    host: Option<String>,

    /// API port (overrides the config file)
    #[arg(long, env = "TELEMON_PORT", value_name = "PORT")]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List unique users from one stats fetch
    Users,

    /// Poll once and print the stats table
    Stats {
        /// Only show records for this user (case-insensitive)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Poll once and print a user's processes
    Processes {
        #[arg(short, long)]
        user: String,
    },

    /// Run a shell command on a monitored system and print its output
    Exec {
        /// Target system (user name)
        system: String,

        /// Command line to run
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Print the latest command output of a system
    Output { system: String },

    /// Look up a single stats record by id
    Lookup { id: String },

    /// List users from the id/user listing
    LegacyUsers,

    /// Write the default configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

fn setup_logging(verbosity: u8) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // The TUI owns stdout, so logs always go to a file
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("telemon")
        .join("logs");

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "telemon.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config_path = cli.config.clone().or_else(|| {
        let default_config = Config::default_path()?;
        if default_config.exists() {
            Some(default_config)
        } else {
            None
        }
    });

    let mut config = if let Some(path) = config_path {
        Config::load(&path)?
    } else {
        Config::default()
    };

    if let Some(host) = &cli.host {
        config.api.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.api.port = port;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive for the duration of the program
    let _logging_guard = setup_logging(cli.verbose)?;

    if let Some(Commands::Init { force }) = &cli.command {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => Config::default_path()
                .ok_or_else(|| anyhow::anyhow!("no configuration directory on this platform"))?,
        };
        return config::init_config(&path, *force);
    }

    let config = load_config(&cli)?;
    let client = ApiClient::from_config(&config.api)?;
    let endpoint = client.endpoint().clone();
    tracing::info!(base_url = %endpoint.base_url(), "using telemetry API");

    let api: Arc<dyn TelemetryApi> = Arc::new(client);
    let aggregator = Arc::new(TelemetryAggregator::new(Arc::clone(&api)));

    match cli.command {
        Some(Commands::Users) => commands::print_users(&aggregator).await?,
        Some(Commands::Stats { user }) => {
            let context = user.map(PollContext::User).unwrap_or(PollContext::All);
            commands::print_stats(&aggregator, context, config.polling.history_capacity).await?;
        }
        Some(Commands::Processes { user }) => {
            commands::print_processes(&aggregator, PollContext::User(user)).await?;
        }
        Some(Commands::Exec { system, command }) => {
            let command = command.join(" ");
            commands::exec(api.as_ref(), &system, &command, config.command.output_delay()).await?;
        }
        Some(Commands::Output { system }) => commands::print_output(api.as_ref(), &system).await?,
        Some(Commands::Lookup { id }) => commands::print_lookup(api.as_ref(), &id).await?,
        Some(Commands::LegacyUsers) => commands::print_legacy_users(api.as_ref()).await?,
        // Handled before the config is loaded
        Some(Commands::Init { .. }) => {}
        None => {
            // Launch the main TUI
            let session = Session {
                endpoint,
                poll_interval: config.polling.interval(),
                history_capacity: config.polling.history_capacity,
                output_delay: config.command.output_delay(),
            };
            let theme = Theme::from_name(&config.display.theme);
            let mut app = App::new(session, theme, aggregator)?;
            app.run().await?;
        }
    }

    Ok(())
}

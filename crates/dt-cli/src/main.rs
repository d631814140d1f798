//! daily-tasks
//!
//! Command line triggers for the daily task scheduler: the nightly generation
//! run, a manager's preparation check and a recurrence preview for template
//! files.
//!
//! ```bash
//! daily-tasks generate --date 2025-02-15
//! daily-tasks prepare --manager 42
//! daily-tasks preview --template-json grill.json --from 2025-02-01 --to 2025-02-28
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dt_core::config::AppConfig;
use dt_core::traits::Id;

#[derive(Parser)]
#[command(name = "daily-tasks", version)]
#[command(about = "Daily task scheduler", long_about = None)]
struct Cli {
    /// Configuration file; DAILY_TASKS__* variables override its values
    #[arg(short, long, global = true)]
    config: Option<String>,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the missing instances of every recurring template due on a day
    Generate {
        /// Day in YYYY-MM-DD; defaults to today in the configured offset
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Report whether a manager's day is prepared
    Prepare {
        #[arg(short, long)]
        manager: Id,
        /// Day in YYYY-MM-DD; defaults to today in the configured offset
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// List the days a template file would be due on
    Preview {
        #[arg(long)]
        template_json: PathBuf,
        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,
        #[arg(long, value_parser = parse_date)]
        to: NaiveDate,
    },
    /// Check the database connection
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json);

    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load(Some(path))
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => AppConfig::from_env().unwrap_or_else(|e| {
            warn!("Failed to load config from env: {}, using defaults", e);
            AppConfig::default()
        }),
    };

    info!(version = env!("CARGO_PKG_VERSION"), "daily-tasks starting");

    match cli.command {
        Commands::Generate { date } => commands::generate(&config, date).await,
        Commands::Prepare { manager, date } => commands::prepare(&config, manager, date).await,
        Commands::Preview { template_json, from, to } => commands::preview(&template_json, from, to),
        Commands::Check => commands::check(&config).await,
    }
}

/// Logs go to stderr so command output on stdout stays machine readable
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,dt_services=debug,dt_db=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

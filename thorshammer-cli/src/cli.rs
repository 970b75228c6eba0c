use anyhow::Context;
use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use inquire::{Password, Text, required};
use thorshammer_core::{CollectionLoop, Config, ProviderId, schedule::parse_time_of_day};
use tracing::info;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "thorshammer", version, about = "Weather poller with daily JSON backups")]
pub struct Cli {
    /// Defaults to `run` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the weather once, then keep running to write the daily backup.
    Run {
        /// Location name, e.g. "Westcliffe, CO". Prompted for when absent.
        #[arg(long)]
        location: Option<String>,

        /// Backup time of day (HH:MM, local); overrides the config file.
        #[arg(long, value_parser = parse_backup_at)]
        backup_at: Option<NaiveTime>,
    },

    /// Store an API key for a provider in the config file.
    Configure {
        /// Provider short name, "weatherbit" or "stormglass".
        provider: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command.unwrap_or(Command::Run { location: None, backup_at: None }) {
            Command::Run { location, backup_at } => run(location, backup_at).await,
            Command::Configure { provider } => configure(&provider),
        }
    }
}

async fn run(location: Option<String>, backup_at: Option<NaiveTime>) -> anyhow::Result<()> {
    let config = Config::load()?;
    // Credentials are checked here, before any request goes out.
    let mut collector = CollectionLoop::from_config(&config)?;

    let location = match location {
        Some(location) => location,
        None => Text::new("Enter location (city, state/country):")
            .with_validator(required!("A location is required"))
            .prompt()
            .context("Failed to read location")?,
    };
    let location = location.trim();

    match collector.run_once(location).await {
        Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
        Err(e) => eprintln!("Failed to get weather data for {location}: {e}"),
    }

    let at = backup_at.unwrap_or(config.backup.at);
    collector.schedule_daily(at);
    println!(
        "Scheduled daily backup at {} into {}.",
        at.format("%H:%M"),
        collector.backup_writer().dir().display()
    );

    tokio::select! {
        _ = collector.run_forever() => {}
        res = tokio::signal::ctrl_c() => {
            res.context("Failed to listen for Ctrl+C")?;
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("{id} API key:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    // Reject an empty or placeholder key before it reaches disk.
    config.resolve_api_key_with(id, |_| None)?;
    config.save()?;

    println!("Saved {id} API key to {}", Config::config_file_path()?.display());
    Ok(())
}

fn parse_backup_at(raw: &str) -> Result<NaiveTime, String> {
    parse_time_of_day(raw).map_err(|e| format!("expected HH:MM ({e})"))
}

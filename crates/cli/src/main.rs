//! Majalis CLI
//!
//! Issue and verify session attendance certificates from the command line.

mod commands;
mod config;
mod factory;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::MajalisConfig;

/// Majalis certificates: issue them for a session, verify them by id.
#[derive(Parser, Debug)]
#[command(name = "majalis", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        env = "MAJALIS_CONFIG",
        default_value = "majalis.toml",
        global = true
    )]
    config: PathBuf,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue certificates to every attendee of a session.
    Issue(commands::issue::IssueArgs),
    /// Look up a certificate by id.
    Verify(commands::verify::VerifyArgs),
    /// Create the certificate store tables, then exit.
    Migrate,
    /// Check that the store and the mail server are reachable.
    Health,
    /// Write a sample DOCX certificate template.
    SampleTemplate(commands::sample_template::SampleTemplateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::SampleTemplate(ref args) => commands::sample_template::run(args)?,
        Command::Migrate => {
            let config = load_config(&cli.config)?;
            commands::migrate::run(&config.store).await?;
        }
        Command::Health => {
            let config = load_config(&cli.config)?;
            return commands::health::run(&config, &cli.format).await;
        }
        Command::Issue(ref args) => {
            let issuer = factory::create_issuer(&load_config(&cli.config)?).await?;
            commands::issue::run(&issuer, args, &cli.format).await?;
        }
        Command::Verify(ref args) => {
            let issuer = factory::create_issuer(&load_config(&cli.config)?).await?;
            return commands::verify::run(&issuer, args, &cli.format).await;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn load_config(path: &Path) -> anyhow::Result<MajalisConfig> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found, using defaults");
    }
    MajalisConfig::load(path)
}

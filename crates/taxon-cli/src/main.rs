//! `taxon` command-line driver
//!
//! Loads the configuration file, connects to the platform and runs one
//! engine entry point. The report text goes to stdout; logs go to stderr.

mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use taxon_reconcile::{Reconciler, Report, UserRef};
use taxon_remote::HttpRemote;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "taxon", version, about = "Sidebar taxonomy reconciliation")]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "TAXON_CONFIG", default_value = "taxon.toml")]
    config: PathBuf,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Join, categorize and order one user's sidebar
    Reconcile {
        /// Username of the member
        #[arg(short, long)]
        user: String,
    },
    /// Reconcile every member of the team
    ReconcileTeam,
    /// Only set the position of declared categories
    Order {
        /// Username of the member
        #[arg(short, long)]
        user: String,
    },
    /// Delete one user's custom sidebar categories
    Purge {
        /// Username of the member
        #[arg(short, long)]
        user: String,
    },
    /// Audit one user, or every member when no user is given
    Check {
        /// Username of the member
        #[arg(short, long)]
        user: Option<String>,
    },
    /// Create every declared channel in the team
    CreateChannels,
    /// List the team's public channels
    Channels,
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<Report> {
    let settings = AppConfig::load(&cli.config)?
        .resolve(|var| std::env::var(var).ok())
        .with_context(|| format!("invalid configuration in {}", cli.config.display()))?;

    tracing::info!(
        server = %settings.http.server_url,
        team = %settings.team,
        categories = settings.taxonomy.len(),
        "taxon starting"
    );

    let remote = HttpRemote::new(settings.http).context("failed to build HTTP client")?;
    let engine = Reconciler::new(Arc::new(remote), settings.taxonomy).with_config(settings.engine);
    let team = &settings.team;

    let report = match cli.command {
        Command::Reconcile { user } => engine.reconcile_user(&UserRef::username(user), team).await,
        Command::ReconcileTeam => engine.reconcile_team(team).await,
        Command::Order { user } => engine.set_category_order(&UserRef::username(user), team).await,
        Command::Purge { user } => engine.purge_user(&UserRef::username(user), team).await,
        Command::Check { user: Some(user) } => {
            engine.audit_user(&UserRef::username(user), team).await.report
        }
        Command::Check { user: None } => engine.audit_team(team).await,
        Command::CreateChannels => engine.create_default_channels(team).await,
        Command::Channels => engine.list_channels(team).await,
    };
    Ok(report)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match run(cli).await {
        Ok(report) => {
            println!("{}", report.text());
            if report.is_aborted() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "taxon failed");
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_user_is_optional() {
        let cli = Cli::try_parse_from(["taxon", "check"]).unwrap();
        assert!(matches!(cli.command, Command::Check { user: None }));

        let cli = Cli::try_parse_from(["taxon", "--log-json", "check", "--user", "boris"]).unwrap();
        assert!(cli.log_json);
        assert!(matches!(cli.command, Command::Check { user: Some(ref u) } if u == "boris"));
    }

    #[test]
    fn test_reconcile_requires_user() {
        assert!(Cli::try_parse_from(["taxon", "reconcile"]).is_err());
        let cli = Cli::try_parse_from(["taxon", "-c", "club.toml", "reconcile-team"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("club.toml"));
        assert!(matches!(cli.command, Command::ReconcileTeam));
    }
}

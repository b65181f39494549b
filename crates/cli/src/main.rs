//! `rcm` command-line client for the claims validation backend
//!
//! Command results go to stdout; progress, notices and errors go to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rcm_core::{JobError, SessionListener};
use rcm_domain::{ClientConfig, ErrorDisposition, RcmError};
use rcm_infra::{config, init_tracing, ApiClient, ApiError};

mod commands;
mod output;

use commands::auth::CredentialArgs;
use commands::claims::ClaimFilterArgs;
use commands::jobs::UploadArgs;
use commands::rulesets::{handle_rule_set_command, RuleSetCommand};
use output::Output;

#[derive(Debug, Parser)]
#[command(name = "rcm", version)]
#[command(about = "Claims validation client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (JSON or TOML); standard locations are probed otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL including `/api`
    #[arg(long, global = true, env = "RCM_API_URL")]
    api_url: Option<String>,

    /// Print backend records as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in and store the session
    Login(CredentialArgs),

    /// Create an account and log in
    Register {
        #[command(flatten)]
        credentials: CredentialArgs,
        #[arg(long)]
        email: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Upload a claims file for validation
    Upload(UploadArgs),

    /// Show one validation job
    Job { id: i64 },

    /// List validation jobs
    Jobs,

    /// List claims
    Claims(ClaimFilterArgs),

    /// Show one claim
    Claim { id: i64 },

    /// Claim statistics by error type
    Stats,

    /// Re-run validation for all claims with the active rule set
    Revalidate,

    /// Manage rule sets
    #[command(subcommand)]
    Rulesets(RuleSetCommand),
}

/// Tells the user to log in again when the refresh token is rejected
struct ReloginNotice;

impl SessionListener for ReloginNotice {
    fn on_session_expired(&self) {
        eprintln!("Your session has expired. Run `rcm login` to sign in again.");
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => config::apply_env_overrides(config::load_from_file(Some(path.clone()))?)?,
        None => config::load()?,
    };

    if let Some(url) = &cli.api_url {
        config.api.base_url = url.trim_end_matches('/').to_string();
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli).context("failed to load configuration")?;
    init_tracing(&config.logging)?;

    let client = ApiClient::connect(&config, Some(Arc::new(ReloginNotice))).await?;
    let out = Output::new(cli.json);

    match cli.command {
        Commands::Login(credentials) => commands::auth::login(&client, out, credentials).await,
        Commands::Register { credentials, email } => {
            commands::auth::register(&client, out, credentials, email).await
        }
        Commands::Logout => commands::auth::logout(&client, out).await,
        Commands::Whoami => commands::auth::whoami(&client, out).await,
        Commands::Upload(args) => commands::jobs::upload(&client, out, args).await,
        Commands::Job { id } => commands::jobs::show(&client, out, id).await,
        Commands::Jobs => commands::jobs::list(&client, out).await,
        Commands::Claims(filters) => commands::claims::list(&client, out, filters).await,
        Commands::Claim { id } => commands::claims::show(&client, out, id).await,
        Commands::Stats => commands::claims::stats(&client, out).await,
        Commands::Revalidate => commands::claims::revalidate(&client, out).await,
        Commands::Rulesets(command) => handle_rule_set_command(&client, out, command).await,
    }
}

/// How the failure should be presented, for errors that carry one
fn disposition(err: &anyhow::Error) -> Option<ErrorDisposition> {
    if let Some(err) = err.downcast_ref::<ApiError>() {
        return Some(RcmError::from(err.clone()).disposition());
    }
    if let Some(err) = err.downcast_ref::<JobError>() {
        return Some(err.disposition());
    }
    err.downcast_ref::<RcmError>().map(RcmError::disposition)
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match disposition(&err) {
                // The session listener has already printed the login hint.
                Some(ErrorDisposition::RequireLogin) => {}
                Some(ErrorDisposition::Alert) => eprintln!("error: {err:#}\nThe outcome is unknown; check again before retrying."),
                _ => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

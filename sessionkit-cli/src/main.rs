//! `sessionkit`: developer CLI for capturing a session and managing account data.
//!
//! The credential is kept in a file-backed durable store under the data directory. Each
//! invocation is its own lifetime, so the account identifier is resolved afresh per run.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use eyre::{eyre, WrapErr};
use serde_json::Value;
use sessionkit_core::{
    CredentialStore, Environment, FileStorage, Request, ServiceConfig, SessionManager,
    StaticNavigation, StoragePaths,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sessionkit", version, about = "SessionKit developer CLI")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Args)]
struct GlobalArgs {
    /// Service environment (`staging` or `production`).
    #[arg(long, env = "SESSIONKIT_ENV", default_value = "staging", value_parser = Environment::from_str)]
    env: Environment,

    /// Overrides the environment's service base URL.
    #[arg(long, env = "SESSIONKIT_BASE_URL")]
    base_url: Option<String>,

    /// Per-request timeout in milliseconds.
    #[arg(long, env = "SESSIONKIT_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Directory the session is persisted under (defaults to the platform data directory).
    #[arg(long, env = "SESSIONKIT_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Captures the credential from a landing URL carrying a `key` query parameter.
    Login {
        /// The full landing URL.
        landing_url: String,
        /// Destination to report once the credential is stored.
        #[arg(long)]
        redirect: Option<String>,
    },
    /// Resolves and prints the authenticated account identifier.
    Whoami,
    /// Ends the session remotely and clears it locally.
    Logout,
    /// Creates a named value. Values are parsed as JSON, falling back to a plain string.
    Add { name: String, value: String },
    /// Prints a named value as JSON.
    Get { name: String },
    /// Creates or overwrites a named value.
    Set { name: String, value: String },
    /// Deletes a named value.
    Remove { name: String },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SESSIONKIT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    // The default `tracing-log` layer also captures the library's `log` records.
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("warning: log output disabled: {err}");
    }
}

fn build_session(args: &GlobalArgs) -> eyre::Result<SessionManager> {
    let mut config = match &args.base_url {
        Some(base_url) => ServiceConfig::new(base_url)?,
        None => ServiceConfig::from_environment(args.env)?,
    };
    if let Some(ms) = args.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }

    let root = args
        .data_dir
        .clone()
        .or_else(dirs::data_dir)
        .ok_or_else(|| eyre!("no platform data directory; pass --data-dir"))?;
    let paths = StoragePaths::new(root);
    tracing::debug!(dir = %paths.sessionkit_dir().display(), "using session storage");
    let durable = FileStorage::open(paths).wrap_err("failed to open session storage")?;

    Ok(SessionManager::new(
        Request::new(config),
        CredentialStore::with_durable(Arc::new(durable)),
    ))
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn run(cli: Cli) -> eyre::Result<()> {
    let session = build_session(&cli.global)?;

    match cli.command {
        Command::Login {
            landing_url,
            redirect,
        } => {
            let navigation = StaticNavigation::new(landing_url);
            session.capture_landing(&navigation, redirect.as_deref())?;
            println!("session captured");
            if let Some(destination) = navigation.replaced_with() {
                println!("redirect: {destination}");
            }
        }
        Command::Whoami => match session.ensure_authenticated().await? {
            Some(account_id) => println!("{account_id}"),
            None => println!("not logged in"),
        },
        Command::Logout => {
            session.logout().await?;
            println!("logged out");
        }
        Command::Add { name, value } => {
            session.data_client().add(&name, &parse_value(&value)).await?;
        }
        Command::Get { name } => match session.data_client().get(&name).await? {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => return Err(eyre!("no value stored under {name}")),
        },
        Command::Set { name, value } => {
            session.data_client().set(&name, &parse_value(&value)).await?;
        }
        Command::Remove { name } => {
            let removed = session.data_client().remove(&name).await?;
            println!("{removed}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_tracing();
    run(Cli::parse()).await
}

//! Information Utility CLI - Main entry point

use clap::{Parser, Subcommand};
use iu_core::UtilityConfig;
use iu_rpc::{commands, AppContext};
use iu_state::Transient;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iu")]
#[command(about = "Information Utility - transaction and compliance ledger", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Organizational identity of the caller
    #[arg(short, long, default_value = "CreditorMSP")]
    msp: String,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an invocation and commit its writes
    Invoke {
        /// Entry point name, e.g. CreateTransaction
        function: String,
        /// Positional string arguments
        args: Vec<String>,
        /// Transient input as key=value or key=@file
        #[arg(short, long = "transient", value_parser = parse_key_value)]
        transient: Vec<(String, String)>,
    },

    /// Evaluate an entry point without committing
    Query {
        /// Entry point name, e.g. ReadTransaction
        function: String,
        /// Positional string arguments
        args: Vec<String>,
        /// Transient input as key=value or key=@file
        #[arg(short, long = "transient", value_parser = parse_key_value)]
        transient: Vec<(String, String)>,
    },

    /// List committed events
    Events {
        /// Only show events with this name
        #[arg(long)]
        name: Option<String>,
    },

    /// Show ledger height and configuration
    Status,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {:?}", s))?;
    if key.is_empty() {
        return Err(format!("empty key in {:?}", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Build the transient map, loading `@file` values from disk
fn load_transient(pairs: Vec<(String, String)>) -> anyhow::Result<Transient> {
    let mut transient = Transient::new();
    for (key, value) in pairs {
        let bytes = match value.strip_prefix('@') {
            Some(path) => std::fs::read(path)?,
            None => value.into_bytes(),
        };
        transient.insert(key, bytes);
    }
    Ok(transient)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => UtilityConfig::from_file(path)?,
        None => UtilityConfig::default(),
    };
    if let Ok(admin_msp) = std::env::var("IU_ADMIN_MSP") {
        config = config.with_admin_msp(admin_msp);
    }

    // Create application context
    let ctx = AppContext::new(&cli.data, config)?;

    match cli.command {
        Commands::Invoke {
            function,
            args,
            transient,
        } => {
            let transient = load_transient(transient)?;
            commands::invoke(&ctx, &cli.msp, &function, &args, transient).await?;
        }

        Commands::Query {
            function,
            args,
            transient,
        } => {
            let transient = load_transient(transient)?;
            commands::query(&ctx, &cli.msp, &function, &args, transient).await?;
        }

        Commands::Events { name } => {
            commands::events(&ctx, name.as_deref())?;
        }

        Commands::Status => {
            commands::status(&ctx)?;
        }
    }

    Ok(())
}

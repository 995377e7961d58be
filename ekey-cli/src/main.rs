//! ekey CLI - tools for ekey mapping exports and the webhook bridge.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  65  Invalid mapping or event, or the bridge rejected the notification
  66  Input file could not be read
  69  Bridge unreachable";

#[derive(Parser)]
#[command(name = "ekey")]
#[command(author, version, about = "Tools for the ekey fingerprint webhook bridge", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a mapping export and print what it contains
    Validate {
        /// Path to the mapping export (JSON)
        #[arg(value_name = "MAPPING")]
        mapping: PathBuf,
    },

    /// Resolve a stored notification against a mapping export
    Resolve {
        /// Path to the mapping export (JSON)
        #[arg(value_name = "MAPPING")]
        mapping: PathBuf,

        /// Path to a notification body (JSON)
        #[arg(value_name = "EVENT")]
        event: PathBuf,
    },

    /// Post a synthetic fingerprint notification to a running bridge
    Send {
        /// Webhook URL, e.g. http://localhost:9123/api/notification/finger
        #[arg(long)]
        url: String,

        /// Bearer token configured on the bridge
        #[arg(long)]
        token: Option<String>,

        /// ekey user id to report
        #[arg(long)]
        user: String,

        /// Finger index (-5 to 5, negative is the left hand, 0 is none)
        #[arg(
            long,
            default_value_t = 2,
            allow_hyphen_values = true,
            value_parser = clap::value_parser!(i64).range(-5..=5)
        )]
        finger: i64,

        /// Result code (10 = match, 30 = no match)
        #[arg(long, default_value_t = 10)]
        result: i64,

        /// Device id used for both controller and reader
        #[arg(long, default_value = "ekey-cli")]
        device: String,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "ekey=debug,ekey_core=debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Validate { mapping } => commands::validate::execute(mapping),
        Commands::Resolve { mapping, event } => commands::resolve::execute(mapping, event),
        Commands::Send {
            url,
            token,
            user,
            finger,
            result,
            device,
        } => {
            let notification = commands::send::Notification {
                user,
                finger,
                result,
                device,
            };
            commands::send::execute(url, token, notification).await
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit = match run(cli).await {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };

    if let Some(message) = &exit.message {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }
    std::process::exit(exit.code);
}

//! # srtoken CLI
//!
//! Command-line front end for [`srtoken`]: generate SR25519 keys, issue
//! bearer tokens from a recovery phrase or secret URI, verify tokens and
//! inspect their content.
//!
//! ## Usage
//!
//! ```bash
//! # Generate a 24 word phrase
//! srtoken keygen --words 24
//!
//! # Issue a 15 minute token for the development account "//Alice"
//! SRTOKEN_PHRASE="//Alice" srtoken issue --ttl 900
//!
//! # Verify it, rejecting tokens older than 10 minutes
//! srtoken verify "$TOKEN" --max-age 600 --format json
//!
//! # Decode without verifying
//! srtoken inspect "$TOKEN"
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod formatter;
pub mod settings;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub use cli::{Cli, Commands, OutputFormat};
pub use commands::{CommandOutput, execute};
pub use error::{CliError, CliResult};
pub use formatter::Formatter;
pub use settings::Settings;

/// Run the CLI application
pub fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;
    let output = execute(cli.command, &settings)?;
    Formatter::new(cli.format, !cli.no_color).display(&output)
}

/// Logs go to stderr so that stdout only carries command output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Already initialized when embedded in another process
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

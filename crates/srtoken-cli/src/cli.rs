//! CLI argument parsing

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Main CLI application structure
#[derive(Parser, Debug)]
#[command(
    name = "srtoken",
    version,
    about = "Issue, verify and inspect SR25519 signed bearer tokens",
    long_about = "srtoken issues self-contained bearer tokens signed with an SR25519 (Substrate) key\n\
                  and verifies them without any prior handshake.\n\n\
                  SECURITY WARNINGS:\n\
                  - A recovery phrase passed with --phrase may end up in shell history\n\
                  - Prefer the SRTOKEN_PHRASE environment variable for real keys\n\
                  - Issued tokens are bearer credentials: anyone holding one can use it until it expires"
)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Enable verbose (debug) logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a new recovery phrase and show its key and address
    Keygen(KeygenArgs),

    /// Issue a token signed by a key
    Issue(IssueArgs),

    /// Verify a token and print the identity it proves
    Verify(VerifyArgs),

    /// Decode a token without checking its signature
    Inspect(InspectArgs),
}

/// Arguments for `keygen`
#[derive(Args, Debug, Clone)]
pub struct KeygenArgs {
    /// Number of words in the phrase (12, 15, 18, 21 or 24)
    #[arg(long, short = 'w', default_value_t = 12)]
    pub words: usize,
}

/// Arguments for `issue`
#[derive(Args, Debug, Clone)]
pub struct IssueArgs {
    /// Recovery phrase or secret URI (e.g. "//Alice") of the signing key
    #[arg(long, short = 'p', env = "SRTOKEN_PHRASE", hide_env_values = true)]
    pub phrase: String,

    /// Token lifetime in seconds (overrides configuration)
    #[arg(long)]
    pub ttl: Option<u64>,
}

/// Arguments for `verify`
#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Token to verify
    pub token: String,

    /// Reject tokens older than this many seconds
    #[arg(long)]
    pub max_age: Option<u64>,

    /// Tolerated clock skew for the issue time, in seconds
    #[arg(long)]
    pub clock_skew: Option<u64>,
}

/// Arguments for `inspect`
#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Token to decode
    pub token: String,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable with colors
    #[default]
    Human,
    /// Pretty JSON
    Json,
    /// Compact JSON (no pretty print)
    Compact,
}

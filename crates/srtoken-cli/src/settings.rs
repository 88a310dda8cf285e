//! Layered configuration
//!
//! Sources, lowest priority first: built-in defaults, the `--config` file,
//! `SRTOKEN_<SECTION>__<FIELD>` environment variables. Command-line flags are
//! applied on top by the commands themselves.
//!
//! ```toml
//! [issuer]
//! token_lifetime_secs = 900
//!
//! [verifier]
//! clock_skew_secs = 30
//! max_age_secs = 600
//! ```

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use srtoken::{IssuerConfig, VerifierConfig};

use crate::error::CliResult;

const ENV_PREFIX: &str = "SRTOKEN";

/// Effective CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Issuance settings
    #[serde(default)]
    pub issuer: IssuerConfig,
    /// Verification settings
    #[serde(default)]
    pub verifier: VerifierConfig,
}

impl Settings {
    /// Load settings from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

//! Issuer, verifier and nonce cache configuration
//!
//! All structures deserialize with defaults for every field, so an empty table in
//! a config file yields the same values as `Default::default()`.

use serde::{Deserialize, Serialize};

use crate::{
    CURRENT_PROTOCOL_VERSION, DEFAULT_SS58_PREFIX, DEFAULT_TOKEN_LIFETIME_SECONDS,
    SUPPORTED_PROTOCOL_VERSIONS, types::Algorithm,
};

/// Token verification configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// The only algorithm accepted in token headers
    #[serde(default)]
    pub expected_algorithm: Algorithm,
    /// Tolerated clock difference for `iat` in seconds (default: 0)
    #[serde(default)]
    pub clock_skew_secs: u64,
    /// Reject tokens older than this many seconds (default: unlimited)
    #[serde(default)]
    pub max_age_secs: Option<u64>,
    /// Accepted `_protocol_metadata.version` values
    #[serde(default = "default_supported_versions")]
    pub supported_versions: Vec<String>,
    /// SS58 prefix `sub` must be encoded under
    #[serde(default = "default_ss58_prefix")]
    pub ss58_prefix: u16,
}

fn default_supported_versions() -> Vec<String> {
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .map(|version| (*version).to_string())
        .collect()
}

fn default_ss58_prefix() -> u16 {
    DEFAULT_SS58_PREFIX
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            expected_algorithm: Algorithm::default(),
            clock_skew_secs: 0,
            max_age_secs: None,
            supported_versions: default_supported_versions(),
            ss58_prefix: default_ss58_prefix(),
        }
    }
}

impl VerifierConfig {
    /// Set the tolerated clock skew
    #[must_use]
    pub fn with_clock_skew(mut self, seconds: u64) -> Self {
        self.clock_skew_secs = seconds;
        self
    }

    /// Set a maximum token age
    #[must_use]
    pub fn with_max_age(mut self, seconds: u64) -> Self {
        self.max_age_secs = Some(seconds);
        self
    }

    /// Replace the accepted protocol versions
    #[must_use]
    pub fn with_supported_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_versions = versions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the SS58 prefix
    #[must_use]
    pub fn with_ss58_prefix(mut self, prefix: u16) -> Self {
        self.ss58_prefix = prefix;
        self
    }

    /// Whether `version` is accepted
    #[must_use]
    pub fn supports_version(&self, version: &str) -> bool {
        self.supported_versions.iter().any(|v| v == version)
    }
}

/// Token issuance configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerConfig {
    /// Token lifetime in seconds (default: 3600)
    #[serde(default = "default_token_lifetime")]
    pub token_lifetime_secs: u64,
    /// Version stamped into `_protocol_metadata`
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    /// SS58 prefix used to derive `sub`
    #[serde(default = "default_ss58_prefix")]
    pub ss58_prefix: u16,
}

fn default_token_lifetime() -> u64 {
    DEFAULT_TOKEN_LIFETIME_SECONDS
}

fn default_protocol_version() -> String {
    CURRENT_PROTOCOL_VERSION.to_string()
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            token_lifetime_secs: default_token_lifetime(),
            protocol_version: default_protocol_version(),
            ss58_prefix: default_ss58_prefix(),
        }
    }
}

impl IssuerConfig {
    /// Set the token lifetime
    #[must_use]
    pub fn with_lifetime(mut self, seconds: u64) -> Self {
        self.token_lifetime_secs = seconds;
        self
    }

    /// Set the SS58 prefix
    #[must_use]
    pub fn with_ss58_prefix(mut self, prefix: u16) -> Self {
        self.ss58_prefix = prefix;
        self
    }
}

/// In-memory nonce cache configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceCacheConfig {
    /// Maximum number of live nonces (default: 100 000)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    100_000
}

impl Default for NonceCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

//! CLI error types

use srtoken::TokenError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Token issuance or verification failed
    #[error("Token error [{category}]: {0}", category = .0.category())]
    Token(#[from] TokenError),

    /// Invalid command arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl CliError {
    /// User-facing hints for resolving the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Token(TokenError::KeyDerivation { .. }) => vec![
                "Check the recovery phrase for typos (English BIP-39 word list)",
                "Secret URIs look like \"<phrase>//hard/soft///password\"",
            ],
            Self::Token(TokenError::TokenExpired { .. }) => vec!["Issue a fresh token"],
            Self::Token(TokenError::TokenNotYetValid { .. }) => {
                vec!["Check the clocks of issuer and verifier, or pass --clock-skew"]
            }
            Self::Token(TokenError::SubjectKeyMismatch { .. }) => {
                vec!["Issuer and verifier must use the same SS58 prefix"]
            }
            Self::Config(_) => vec![
                "Check the --config file syntax",
                "Environment overrides use SRTOKEN_<SECTION>__<FIELD>",
            ],
            _ => vec![],
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

//! Command implementations
//!
//! Each command returns a [`CommandOutput`]; printing is left to the
//! [`Formatter`](crate::formatter::Formatter).

use serde::Serialize;
use srtoken::{
    Claims, Header, IssuerConfig, Sr25519Keypair, TokenIssuer, TokenVerifier, VerifiedIdentity,
    canonical::{decode_claims, decode_header},
    generate_phrase,
    segments::{RawToken, decode_segment},
};
use tracing::debug;

use crate::{
    cli::{Commands, InspectArgs, IssueArgs, KeygenArgs, VerifyArgs},
    error::{CliError, CliResult},
    settings::Settings,
};

/// Result of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    /// Newly generated key material
    Keygen(KeygenOutput),
    /// Issued token
    Issued(IssuedOutput),
    /// Identity proven by a verified token
    Verified(VerifiedIdentity),
    /// Decoded, unverified token content
    Inspected(InspectOutput),
}

/// Output of `keygen`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeygenOutput {
    /// Recovery phrase
    pub phrase: String,
    /// Public key, hex
    pub public_key: String,
    /// SS58 address
    pub address: String,
}

/// Output of `issue`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedOutput {
    /// Token string
    pub token: String,
    /// Claims carried by the token
    pub claims: Claims,
}

/// Output of `inspect`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectOutput {
    /// Decoded header
    pub header: Header,
    /// Decoded claims
    pub claims: Claims,
    /// Signature length in bytes
    pub signature_len: usize,
    /// Always false: the signature is not checked
    pub verified: bool,
}

/// Dispatch a parsed command
pub fn execute(command: Commands, settings: &Settings) -> CliResult<CommandOutput> {
    match command {
        Commands::Keygen(args) => keygen(&args, settings),
        Commands::Issue(args) => issue(&args, settings),
        Commands::Verify(args) => verify(&args, settings),
        Commands::Inspect(args) => inspect(&args),
    }
}

/// Generate a phrase and derive its key and address
pub fn keygen(args: &KeygenArgs, settings: &Settings) -> CliResult<CommandOutput> {
    let phrase = generate_phrase(args.words)?;
    let keypair = Sr25519Keypair::from_phrase(&phrase, "")?;

    Ok(CommandOutput::Keygen(KeygenOutput {
        public_key: hex::encode(keypair.public_key_bytes()),
        address: keypair.address(settings.issuer.ss58_prefix)?,
        phrase,
    }))
}

/// Issue a token for the key behind a phrase or secret URI
pub fn issue(args: &IssueArgs, settings: &Settings) -> CliResult<CommandOutput> {
    let mut config: IssuerConfig = settings.issuer.clone();
    if let Some(ttl) = args.ttl {
        if ttl == 0 {
            return Err(CliError::InvalidArguments(
                "--ttl must be at least 1 second".to_string(),
            ));
        }
        config = config.with_lifetime(ttl);
    }

    let keypair = Sr25519Keypair::from_uri(&args.phrase)?;
    let issued = TokenIssuer::sr25519(config).issue(&keypair)?;
    debug!(subject = %issued.claims.sub, "Token issued from CLI");

    Ok(CommandOutput::Issued(IssuedOutput {
        token: issued.as_str().to_string(),
        claims: issued.claims,
    }))
}

/// Verify a token against the current time
pub fn verify(args: &VerifyArgs, settings: &Settings) -> CliResult<CommandOutput> {
    let mut config = settings.verifier.clone();
    if let Some(max_age) = args.max_age {
        config = config.with_max_age(max_age);
    }
    if let Some(skew) = args.clock_skew {
        config = config.with_clock_skew(skew);
    }

    let identity = TokenVerifier::sr25519(config).verify(args.token.trim())?;
    Ok(CommandOutput::Verified(identity))
}

/// Decode header and claims without verifying anything
pub fn inspect(args: &InspectArgs) -> CliResult<CommandOutput> {
    let raw = RawToken::parse(args.token.trim())?;
    let header = decode_header(&decode_segment(raw.header(), "header")?)?;
    let claims = decode_claims(&decode_segment(raw.claims(), "claims")?)?;
    let signature = decode_segment(raw.signature(), "signature")?;

    Ok(CommandOutput::Inspected(InspectOutput {
        header,
        claims,
        signature_len: signature.len(),
        verified: false,
    }))
}

//! Core token types
//!
//! Header and claims are fixed records rather than open maps so that their
//! encoding stays deterministic. `_protocol_metadata` is the extension point for
//! protocol-level additions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CURRENT_PROTOCOL_VERSION, Result, SR25519_ALGORITHM, TOKEN_TYPE, errors::TokenError};

/// Signature algorithms understood by this crate
///
/// Header values are compared against [`Algorithm::as_str`]; unknown
/// identifiers surface as `UnsupportedAlgorithm`, not as a decoding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Algorithm {
    /// Schnorr signatures over Ristretto25519 (Substrate `sr25519`)
    #[default]
    #[serde(rename = "SR25519")]
    Sr25519,
}

impl Algorithm {
    /// Header identifier for the algorithm
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sr25519 => SR25519_ALGORITHM,
        }
    }

    /// Raw signature length in bytes
    #[must_use]
    pub fn signature_len(self) -> usize {
        match self {
            Self::Sr25519 => 64,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Signature algorithm identifier
    pub alg: String,
    /// Token type, always `JWT`
    pub typ: String,
}

impl Header {
    /// Header for the given algorithm
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            alg: algorithm.as_str().to_string(),
            typ: TOKEN_TYPE.to_string(),
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new(Algorithm::Sr25519)
    }
}

/// Protocol metadata carried in every token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolMetadata {
    /// Protocol version, e.g. `1.0.0`
    pub version: String,
}

impl Default for ProtocolMetadata {
    fn default() -> Self {
        Self {
            version: CURRENT_PROTOCOL_VERSION.to_string(),
        }
    }
}

/// Token claims
///
/// Field declaration order is the wire order; see [`crate::canonical`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: SS58 address derived from `public_key`
    pub sub: String,

    /// Signer public key, lowercase hex without `0x`
    #[serde(rename = "publicKey")]
    pub public_key: String,

    /// Issued-at, Unix seconds
    pub iat: u64,

    /// Expiration, Unix seconds (exclusive)
    pub exp: u64,

    /// Unique value for replay detection
    pub nonce: String,

    /// Protocol metadata
    #[serde(rename = "_protocol_metadata")]
    pub protocol_metadata: ProtocolMetadata,
}

impl Claims {
    /// Decode the hex public key
    pub fn public_key_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(&self.public_key)
            .map_err(|e| TokenError::malformed(format!("publicKey is not valid hex: {e}")))
    }

    /// Check the structural requirements every token must meet
    ///
    /// Nonce format is left to the claims validator.
    pub fn check_structure(&self) -> Result<()> {
        if self.sub.is_empty() {
            return Err(TokenError::malformed("missing sub claim"));
        }
        if self.public_key.is_empty() {
            return Err(TokenError::malformed("missing publicKey claim"));
        }
        self.public_key_bytes()?;
        if self.iat == 0 {
            return Err(TokenError::malformed("iat must be a positive integer"));
        }
        if self.exp <= self.iat {
            return Err(TokenError::malformed(format!(
                "exp ({}) must be after iat ({})",
                self.exp, self.iat
            )));
        }
        if self.protocol_metadata.version.is_empty() {
            return Err(TokenError::malformed("missing _protocol_metadata.version"));
        }
        Ok(())
    }
}

/// Token whose structure and signature have been verified, but whose claims have
/// not yet been checked against the clock, the address rule or a nonce cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    /// Decoded header
    pub header: Header,
    /// Decoded claims
    pub claims: Claims,
    /// Raw signature bytes
    pub signature: Vec<u8>,
}

/// Identity established by a fully validated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedIdentity {
    /// SS58 address of the token holder
    pub subject: String,
    /// Raw public key bytes
    #[serde(serialize_with = "serialize_hex")]
    pub public_key: Vec<u8>,
    /// Issued-at, Unix seconds
    pub issued_at: u64,
    /// Expiration, Unix seconds
    pub expires_at: u64,
    /// Nonce consumed by this token
    pub nonce: String,
}

impl VerifiedIdentity {
    /// Public key as lowercase hex
    #[must_use]
    pub fn public_key_hex(&self) -> String {
        hex::encode(&self.public_key)
    }
}

fn serialize_hex<S>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&hex::encode(bytes))
}

//! Structural and cryptographic token verification
//!
//! [`TokenVerifier::decode_and_verify`] turns a token string into a
//! [`DecodedToken`] whose signature is known to be valid. [`TokenVerifier::verify`]
//! additionally runs the [`ClaimsValidator`].
//!
//! The signature is checked over the segment bytes exactly as received. Decoded
//! claims are never re-encoded for verification.

use std::{fmt, sync::Arc};

use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::{
    Result, TOKEN_TYPE,
    canonical::{decode_claims, decode_header},
    config::VerifierConfig,
    errors::TokenError,
    keys::{KeyScheme, Sr25519Scheme},
    nonce::NonceCache,
    segments::{RawToken, decode_segment},
    types::{DecodedToken, VerifiedIdentity},
    unix_now,
    validator::ClaimsValidator,
};

/// Where the verification key comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyTrust {
    /// Use the `publicKey` claim; it is bound to `sub` by address derivation
    #[default]
    SelfAsserted,
    /// Verify against this independently known public key; the `publicKey`
    /// claim must equal it
    Anchored(Vec<u8>),
}

/// Token verifier
#[derive(Clone)]
pub struct TokenVerifier {
    config: VerifierConfig,
    scheme: Arc<dyn KeyScheme>,
    trust: KeyTrust,
    validator: ClaimsValidator,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("config", &self.config)
            .field("trust", &self.trust)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Create a verifier for the given key scheme
    pub fn new(config: VerifierConfig, scheme: Arc<dyn KeyScheme>) -> Self {
        let validator = ClaimsValidator::new(&config, scheme.clone());
        Self {
            config,
            scheme,
            trust: KeyTrust::default(),
            validator,
        }
    }

    /// Create an SR25519 verifier
    pub fn sr25519(config: VerifierConfig) -> Self {
        Self::new(config, Arc::new(Sr25519Scheme))
    }

    /// Set the key trust model
    #[must_use]
    pub fn with_trust(mut self, trust: KeyTrust) -> Self {
        self.trust = trust;
        self
    }

    /// Attach a nonce cache for replay detection
    #[must_use]
    pub fn with_nonce_cache(mut self, cache: Arc<dyn NonceCache>) -> Self {
        self.validator = self.validator.with_nonce_cache(cache);
        self
    }

    /// Verifier configuration
    #[must_use]
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Claims validator used by [`verify`](Self::verify)
    #[must_use]
    pub fn validator(&self) -> &ClaimsValidator {
        &self.validator
    }

    /// Verify a token against the current time
    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity> {
        self.verify_at(token, unix_now()?)
    }

    /// Verify a token against `now` (Unix seconds)
    pub fn verify_at(&self, token: &str, now: u64) -> Result<VerifiedIdentity> {
        let result = self
            .decode_and_verify(token)
            .and_then(|decoded| self.validator.validate_at(&decoded.claims, now));

        match &result {
            Ok(identity) => debug!(subject = %identity.subject, "Token verified"),
            Err(e) => warn!(category = e.category(), error = %e, "Token rejected"),
        }
        result
    }

    /// Parse a token and check its header, claim structure and signature
    ///
    /// Time, subject binding and replay checks are not applied.
    pub fn decode_and_verify(&self, token: &str) -> Result<DecodedToken> {
        let raw = RawToken::parse(token)?;

        let header = decode_header(&decode_segment(raw.header(), "header")?)?;
        if header.alg != self.config.expected_algorithm.as_str() {
            return Err(TokenError::UnsupportedAlgorithm {
                algorithm: header.alg,
            });
        }
        if header.typ != TOKEN_TYPE {
            return Err(TokenError::UnsupportedAlgorithm {
                algorithm: format!("{} (typ {})", header.alg, header.typ),
            });
        }

        let claims = decode_claims(&decode_segment(raw.claims(), "claims")?)?;
        claims.check_structure()?;
        let claimed_key = claims.public_key_bytes()?;
        if claimed_key.len() != self.scheme.public_key_len() {
            return Err(TokenError::malformed(format!(
                "publicKey must be {} bytes, got {}",
                self.scheme.public_key_len(),
                claimed_key.len()
            )));
        }
        if !self.config.supports_version(&claims.protocol_metadata.version) {
            return Err(TokenError::UnsupportedProtocolVersion {
                version: claims.protocol_metadata.version,
            });
        }

        let signature = decode_segment(raw.signature(), "signature")?;
        let verification_key = match &self.trust {
            KeyTrust::SelfAsserted => claimed_key.as_slice(),
            KeyTrust::Anchored(anchor) => anchor.as_slice(),
        };
        self.scheme
            .verify(verification_key, &raw.signing_input(), &signature)?;

        if let KeyTrust::Anchored(anchor) = &self.trust
            && !bool::from(anchor.as_slice().ct_eq(claimed_key.as_slice()))
        {
            return Err(TokenError::SubjectKeyMismatch {
                reason: "publicKey differs from the trusted key".to_string(),
            });
        }

        Ok(DecodedToken {
            header,
            claims,
            signature,
        })
    }
}

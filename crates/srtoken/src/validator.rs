//! Semantic claim checks
//!
//! Runs after the signature has been verified. Checks fail fast in this order:
//!
//! 1. `iat` not in the future beyond the clock skew
//! 2. `now < exp`
//! 3. token age within `max_age_secs`, when configured
//! 4. `sub` is the address derived from `publicKey`
//! 5. `nonce` present, and fresh in the nonce cache when one is attached
//!
//! The nonce is recorded last so that a token rejected for any other reason does
//! not consume its nonce.

use std::{fmt, sync::Arc};

use tracing::debug;

use crate::{
    Result,
    config::VerifierConfig,
    errors::TokenError,
    keys::KeyScheme,
    nonce::NonceCache,
    types::{Claims, VerifiedIdentity},
    unix_now,
};

/// Validator for decoded, signature-checked claims
#[derive(Clone)]
pub struct ClaimsValidator {
    scheme: Arc<dyn KeyScheme>,
    ss58_prefix: u16,
    clock_skew_secs: u64,
    max_age_secs: Option<u64>,
    nonce_cache: Option<Arc<dyn NonceCache>>,
}

impl fmt::Debug for ClaimsValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimsValidator")
            .field("ss58_prefix", &self.ss58_prefix)
            .field("clock_skew_secs", &self.clock_skew_secs)
            .field("max_age_secs", &self.max_age_secs)
            .field("nonce_cache", &self.nonce_cache)
            .finish_non_exhaustive()
    }
}

impl ClaimsValidator {
    /// Create a validator using the address prefix and time limits from `config`
    pub fn new(config: &VerifierConfig, scheme: Arc<dyn KeyScheme>) -> Self {
        Self {
            scheme,
            ss58_prefix: config.ss58_prefix,
            clock_skew_secs: config.clock_skew_secs,
            max_age_secs: config.max_age_secs,
            nonce_cache: None,
        }
    }

    /// Attach a nonce cache for replay detection
    #[must_use]
    pub fn with_nonce_cache(mut self, cache: Arc<dyn NonceCache>) -> Self {
        self.nonce_cache = Some(cache);
        self
    }

    /// Attached nonce cache, if any
    #[must_use]
    pub fn nonce_cache(&self) -> Option<&Arc<dyn NonceCache>> {
        self.nonce_cache.as_ref()
    }

    /// Validate claims against the current time
    pub fn validate(&self, claims: &Claims) -> Result<VerifiedIdentity> {
        self.validate_at(claims, unix_now()?)
    }

    /// Validate claims against `now` (Unix seconds)
    pub fn validate_at(&self, claims: &Claims, now: u64) -> Result<VerifiedIdentity> {
        if claims.iat > now.saturating_add(self.clock_skew_secs) {
            return Err(TokenError::TokenNotYetValid {
                issued_at: claims.iat,
                now,
                max_skew_seconds: self.clock_skew_secs,
            });
        }

        if now >= claims.exp {
            return Err(TokenError::TokenExpired {
                expired_at: claims.exp,
                now,
            });
        }

        if let Some(max_age) = self.max_age_secs {
            let age = now.saturating_sub(claims.iat);
            if age > max_age {
                return Err(TokenError::TokenTooOld {
                    age_seconds: age,
                    max_age_seconds: max_age,
                });
            }
        }

        let public_key = claims.public_key_bytes()?;
        let derived = self
            .scheme
            .derive_address(&public_key, self.ss58_prefix)
            .map_err(|e| TokenError::SubjectKeyMismatch {
                reason: format!("cannot derive address from publicKey: {e}"),
            })?;
        if derived != claims.sub {
            return Err(TokenError::SubjectKeyMismatch {
                reason: format!("publicKey derives {derived}, token claims {}", claims.sub),
            });
        }

        if claims.nonce.is_empty() {
            return Err(TokenError::malformed("missing nonce claim"));
        }

        if let Some(cache) = &self.nonce_cache
            && !cache.check_and_insert(&claims.nonce, claims.exp, now)?
        {
            return Err(TokenError::ReplayDetected {
                nonce: claims.nonce.clone(),
            });
        }

        debug!(subject = %claims.sub, "Claims validated");

        Ok(VerifiedIdentity {
            subject: claims.sub.clone(),
            public_key,
            issued_at: claims.iat,
            expires_at: claims.exp,
            nonce: claims.nonce.clone(),
        })
    }
}

//! Token issuance
//!
//! Builds claims for a signer, encodes header and claims canonically, signs the
//! exact `header "." claims` segment bytes and assembles the token.

use std::{fmt, sync::Arc};

use tracing::debug;
use uuid::Uuid;

use crate::{
    Result,
    canonical::{encode_claims, encode_header},
    config::IssuerConfig,
    errors::TokenError,
    keys::{KeyScheme, Sr25519Scheme, TokenSigner},
    segments::{assemble, encode_segment, signing_input},
    types::{Claims, Header, ProtocolMetadata},
    unix_now,
};

/// A freshly issued token together with the claims it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    token: String,
    /// Claims encoded into the token
    pub claims: Claims,
}

impl IssuedToken {
    /// Token string suitable for an `Authorization: Bearer` header
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Consume into the token string
    #[must_use]
    pub fn into_string(self) -> String {
        self.token
    }
}

impl fmt::Display for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// Token issuer
#[derive(Clone)]
pub struct TokenIssuer {
    config: IssuerConfig,
    scheme: Arc<dyn KeyScheme>,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("config", &self.config)
            .field("algorithm", &self.scheme.algorithm())
            .finish()
    }
}

impl TokenIssuer {
    /// Create an issuer for the given key scheme
    ///
    /// `sub` is derived under `config.ss58_prefix`.
    pub fn new(config: IssuerConfig, scheme: Arc<dyn KeyScheme>) -> Self {
        Self { config, scheme }
    }

    /// Create an SR25519 issuer
    pub fn sr25519(config: IssuerConfig) -> Self {
        Self::new(config, Arc::new(Sr25519Scheme))
    }

    /// Issuer configuration
    #[must_use]
    pub fn config(&self) -> &IssuerConfig {
        &self.config
    }

    /// Issue a token for `signer`, valid from now for the configured lifetime
    pub fn issue(&self, signer: &dyn TokenSigner) -> Result<IssuedToken> {
        self.issue_at(signer, unix_now()?)
    }

    /// Issue a token with `iat = now`
    pub fn issue_at(&self, signer: &dyn TokenSigner, now: u64) -> Result<IssuedToken> {
        let claims = self.claims_for(signer, now)?;
        self.issue_claims(signer, claims)
    }

    /// Build the standard claims for `signer` without signing them
    pub fn claims_for(&self, signer: &dyn TokenSigner, now: u64) -> Result<Claims> {
        let public_key = signer.public_key();
        let exp = now
            .checked_add(self.config.token_lifetime_secs)
            .ok_or_else(|| TokenError::InvalidClaims {
                reason: "token lifetime overflows the expiry timestamp".to_string(),
            })?;

        Ok(Claims {
            sub: self
                .scheme
                .derive_address(&public_key, self.config.ss58_prefix)?,
            public_key: hex::encode(&public_key),
            iat: now,
            exp,
            nonce: Uuid::new_v4().to_string(),
            protocol_metadata: ProtocolMetadata {
                version: self.config.protocol_version.clone(),
            },
        })
    }

    /// Sign caller-supplied claims
    ///
    /// `publicKey` must be the signer's key and the validity window must be
    /// non-empty. The `sub` binding is left to verifiers.
    pub fn issue_claims(&self, signer: &dyn TokenSigner, claims: Claims) -> Result<IssuedToken> {
        if signer.algorithm() != self.scheme.algorithm() {
            return Err(TokenError::InvalidClaims {
                reason: format!(
                    "signer algorithm {} does not match scheme {}",
                    signer.algorithm(),
                    self.scheme.algorithm()
                ),
            });
        }
        if claims.exp <= claims.iat {
            return Err(TokenError::InvalidClaims {
                reason: format!("exp ({}) must be after iat ({})", claims.exp, claims.iat),
            });
        }
        if claims.nonce.is_empty() {
            return Err(TokenError::InvalidClaims {
                reason: "nonce must not be empty".to_string(),
            });
        }
        claims
            .check_structure()
            .map_err(|e| TokenError::InvalidClaims {
                reason: e.to_string(),
            })?;
        if claims.public_key_bytes()? != signer.public_key() {
            return Err(TokenError::InvalidClaims {
                reason: "publicKey does not belong to the signer".to_string(),
            });
        }

        let header = Header::new(self.scheme.algorithm());
        let header_segment = encode_segment(&encode_header(&header)?);
        let claims_segment = encode_segment(&encode_claims(&claims)?);

        let signature = signer.sign(&signing_input(&header_segment, &claims_segment))?;
        if signature.len() != self.scheme.signature_len() {
            return Err(TokenError::Signing {
                reason: format!(
                    "signer produced {} byte signature, expected {}",
                    signature.len(),
                    self.scheme.signature_len()
                ),
            });
        }

        debug!(
            subject = %claims.sub,
            nonce = %claims.nonce,
            expires_at = claims.exp,
            "Issued token"
        );

        Ok(IssuedToken {
            token: assemble(&header_segment, &claims_segment, &encode_segment(&signature)),
            claims,
        })
    }
}

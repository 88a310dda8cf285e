//! # srtoken - SR25519 Signed Bearer Tokens
//!
//! Self-contained bearer tokens in the familiar `header.claims.signature` shape,
//! signed with SR25519 (Schnorr signatures over Ristretto25519, the Substrate
//! key scheme) instead of a shared secret or a conventional JOSE algorithm.
//!
//! A holder of an SR25519 key proves its identity to a service without any prior
//! handshake: the token carries the public key, the SS58 address derived from it,
//! a validity window and a nonce, and the signature covers the exact encoded bytes.
//!
//! ## Architecture
//!
//! - [`canonical`] - Deterministic byte encoding of header and claims
//! - [`segments`] - base64url segment codec, token assembly and parsing
//! - [`keys`] - Key-system capabilities (`TokenSigner`, `KeyScheme`) and the SR25519 implementation
//! - [`ss58`] - SS58 address encoding (address derivation rule)
//! - [`issuer`] - Token issuance (claims → canonical bytes → signature → token)
//! - [`verifier`] - Structural and cryptographic verification
//! - [`validator`] - Semantic claim checks (time window, subject binding, replay)
//! - [`nonce`] - Nonce cache with atomic check-and-insert
//! - [`bearer`] - `Authorization: Bearer` extraction for transport layers
//! - [`config`] - Issuer/verifier configuration
//! - [`errors`] - Typed failure taxonomy
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use srtoken::{IssuerConfig, Sr25519Keypair, Sr25519Scheme, TokenIssuer, TokenVerifier, VerifierConfig};
//!
//! let keypair = Sr25519Keypair::from_seed(&[7u8; 32])?;
//! let scheme = Arc::new(Sr25519Scheme::default());
//!
//! let issuer = TokenIssuer::new(IssuerConfig::default(), scheme.clone());
//! let issued = issuer.issue(&keypair)?;
//!
//! let verifier = TokenVerifier::new(VerifierConfig::default(), scheme);
//! let identity = verifier.verify(issued.as_str())?;
//! assert_eq!(identity.subject, issued.claims.sub);
//! # Ok::<(), srtoken::TokenError>(())
//! ```
//!
//! ## Security Notes
//!
//! - The signature is always checked over the original encoded segments, never over
//!   a re-serialization of the decoded claims.
//! - Only the single `SR25519` algorithm is accepted; anything else in the header is
//!   rejected before any key material is touched.
//! - Every failure is a distinct [`TokenError`] for logging and tests; transports
//!   should collapse them to one unauthenticated response (see [`bearer`]).

pub mod bearer;
pub mod canonical;
pub mod config;
pub mod errors;
pub mod issuer;
pub mod keys;
pub mod nonce;
pub mod segments;
pub mod ss58;
pub mod types;
pub mod validator;
pub mod verifier;

pub use bearer::{
    BearerAuthenticator, Unauthenticated, VerifyToken, extract_bearer, extract_bearer_from,
};
pub use config::{IssuerConfig, NonceCacheConfig, VerifierConfig};
pub use errors::*;
pub use issuer::{IssuedToken, TokenIssuer};
pub use keys::{KeyScheme, Sr25519Keypair, Sr25519Scheme, TokenSigner, generate_phrase};
pub use nonce::{MemoryNonceCache, NonceCache};
pub use types::*;
pub use validator::ClaimsValidator;
pub use verifier::{KeyTrust, TokenVerifier};

/// srtoken result type
pub type Result<T> = std::result::Result<T, TokenError>;

/// Header `alg` value for this scheme
pub const SR25519_ALGORITHM: &str = "SR25519";

/// Header `typ` value
pub const TOKEN_TYPE: &str = "JWT";

/// Protocol version stamped into `_protocol_metadata` by this issuer
pub const CURRENT_PROTOCOL_VERSION: &str = "1.0.0";

/// Protocol versions this verifier understands
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["1.0.0"];

/// Default token lifetime (1 hour)
pub const DEFAULT_TOKEN_LIFETIME_SECONDS: u64 = 3600;

/// Generic Substrate SS58 address prefix
pub const DEFAULT_SS58_PREFIX: u16 = 42;

/// Current Unix time in whole seconds
pub(crate) fn unix_now() -> Result<u64> {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|_| TokenError::Internal {
            reason: "System clock before Unix epoch".to_string(),
        })
}

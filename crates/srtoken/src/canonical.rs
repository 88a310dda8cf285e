//! Canonical encoding of header and claims
//!
//! The bytes produced here are what gets base64url-encoded and signed, so the
//! encoding is part of the protocol:
//!
//! - keys appear in struct declaration order (`alg`, `typ` / `sub`, `publicKey`,
//!   `iat`, `exp`, `nonce`, `_protocol_metadata`)
//! - compact JSON, no insignificant whitespace
//! - integers in plain decimal, never with a fraction or exponent
//! - strings escaped by a single fixed rule set (`serde_json`'s)
//!
//! Verification never depends on re-encoding: the verifier signs over the segments
//! it received. Encoding determinism matters for issuers and for anyone who wants
//! to reproduce a token byte-for-byte.

use serde::Serialize;

use crate::{
    Result,
    errors::TokenError,
    types::{Claims, Header},
};

/// Canonical bytes of a token header
pub fn encode_header(header: &Header) -> Result<Vec<u8>> {
    encode(header, "header")
}

/// Canonical bytes of token claims
pub fn encode_claims(claims: &Claims) -> Result<Vec<u8>> {
    encode(claims, "claims")
}

/// Decode header bytes
pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    serde_json::from_slice(bytes)
        .map_err(|e| TokenError::malformed(format!("Failed to decode header: {e}")))
}

/// Decode claims bytes
pub fn decode_claims(bytes: &[u8]) -> Result<Claims> {
    serde_json::from_slice(bytes)
        .map_err(|e| TokenError::malformed(format!("Failed to decode claims: {e}")))
}

fn encode<T: Serialize>(value: &T, what: &str) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| TokenError::Internal {
        reason: format!("Failed to encode {what}: {e}"),
    })
}

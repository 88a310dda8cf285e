//! Common test utilities for integration tests
//!
//! Keys are built per test from well-known development URIs or fixed seeds;
//! nothing is shared between tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use srtoken::{
    IssuedToken, IssuerConfig, Sr25519Keypair, Sr25519Scheme, TokenIssuer, TokenSigner,
    TokenVerifier, VerifierConfig,
    segments::{assemble, encode_segment, signing_input},
};

/// Fixed reference time for deterministic tests
pub const NOW: u64 = 1_700_000_000;

/// SS58 address of `//Alice` under the generic Substrate prefix
pub const ALICE_ADDRESS: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

/// Current Unix time
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// The `//Alice` development keypair
pub fn alice() -> Sr25519Keypair {
    Sr25519Keypair::from_uri("//Alice").expect("Alice keypair")
}

/// The `//Bob` development keypair
pub fn bob() -> Sr25519Keypair {
    Sr25519Keypair::from_uri("//Bob").expect("Bob keypair")
}

/// Default SR25519 scheme
pub fn scheme() -> Arc<Sr25519Scheme> {
    Arc::new(Sr25519Scheme::default())
}

/// Issuer with default configuration
pub fn issuer() -> TokenIssuer {
    TokenIssuer::new(IssuerConfig::default(), scheme())
}

/// Verifier with default configuration
pub fn verifier() -> TokenVerifier {
    TokenVerifier::new(VerifierConfig::default(), scheme())
}

/// Issue a default token for `signer` at `now`
pub fn issue_at(signer: &dyn TokenSigner, now: u64) -> IssuedToken {
    issuer().issue_at(signer, now).expect("token issuance")
}

/// Build a token from raw header and claims JSON, signed by `signer`
///
/// Bypasses the issuer so tests can present arbitrary content with a valid
/// signature.
pub fn forge_token(header_json: &str, claims_json: &str, signer: &dyn TokenSigner) -> String {
    let header = encode_segment(header_json.as_bytes());
    let claims = encode_segment(claims_json.as_bytes());
    let signature = signer
        .sign(&signing_input(&header, &claims))
        .expect("signing");
    assemble(&header, &claims, &encode_segment(&signature))
}

/// Standard claims JSON for `signer`
pub fn claims_json(signer: &Sr25519Keypair, iat: u64, exp: u64, nonce: &str) -> String {
    serde_json::json!({
        "sub": signer.address(42).expect("address"),
        "publicKey": hex::encode(signer.public_key_bytes()),
        "iat": iat,
        "exp": exp,
        "nonce": nonce,
        "_protocol_metadata": { "version": "1.0.0" },
    })
    .to_string()
}

/// Replace the character at `index` with a different base64url character
pub fn flip_char(token: &str, index: usize) -> String {
    let mut bytes = token.as_bytes().to_vec();
    bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
    String::from_utf8(bytes).expect("ascii token")
}

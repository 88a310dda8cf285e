//! Security attack scenario tests
//!
//! Tests cover:
//! - Tampering with any single character of any segment
//! - Algorithm confusion (HS256, `none`, case variants, wrong `typ`)
//! - Identity substitution (claiming someone else's address)
//! - Signature splicing between tokens
//! - Trust-anchor pinning
//! - Garbage input never panics

mod common;

use common::{
    ALICE_ADDRESS, NOW, alice, bob, claims_json, flip_char, forge_token, issue_at, scheme,
    verifier,
};
use proptest::prelude::*;
use srtoken::{KeyTrust, TokenError, TokenSigner, TokenVerifier, VerifierConfig};

/// Test: Flipping one character anywhere breaks verification
///
/// Attack: Attacker edits claims (or header, or signature) in transit
/// Defense: Signature covers the exact segment bytes
#[test]
fn test_single_character_tampering_is_detected() {
    // GIVEN: A valid token
    let issued = issue_at(&alice(), NOW);
    let token = issued.as_str();
    let header_end = token.find('.').unwrap();
    let claims_end = token.rfind('.').unwrap();

    for index in (0..token.len()).filter(|i| token.as_bytes()[*i] != b'.') {
        // WHEN: One character is replaced
        let tampered = flip_char(token, index);
        let result = verifier().verify_at(&tampered, NOW);

        // THEN: Verification fails before any claim is trusted
        match result {
            Err(TokenError::InvalidSignature | TokenError::MalformedToken { .. }) => {}
            Err(TokenError::UnsupportedAlgorithm { .. }) if index < header_end => {}
            Err(TokenError::UnsupportedProtocolVersion { .. }) if index < claims_end => {}
            other => panic!("tampering at {index} gave {other:?}"),
        }
    }
}

/// Test: HS256 token is rejected before any key is touched
#[test]
fn test_reject_hs256_token() {
    // GIVEN: A conventional HS256 JWT
    let hs256 = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
        eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IkpvaG4gRG9lIiwiaWF0IjoxNTE2MjM5MDIyfQ.\
        SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c";

    // WHEN/THEN: It is an unsupported algorithm
    assert_eq!(
        verifier().verify_at(hs256, NOW),
        Err(TokenError::UnsupportedAlgorithm {
            algorithm: "HS256".to_string()
        })
    );
}

/// Test: alg:none with an empty signature segment
#[test]
fn test_reject_none_algorithm() {
    // GIVEN: alg:none token without signature
    let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJzdWIiOiJhdHRhY2tlciJ9.";

    // WHEN/THEN: Structure is rejected before the header is considered
    assert!(matches!(
        verifier().verify_at(token, NOW),
        Err(TokenError::MalformedToken { .. })
    ));
}

/// Test: Header variants that are not exactly SR25519/JWT
#[test]
fn test_reject_algorithm_variants() {
    let keypair = alice();
    let claims = claims_json(&keypair, NOW, NOW + 3600, "n-1");

    for header in [
        r#"{"alg":"sr25519","typ":"JWT"}"#,
        r#"{"alg":"ED25519","typ":"JWT"}"#,
        r#"{"alg":"none","typ":"JWT"}"#,
        r#"{"alg":"SR25519","typ":"JWS"}"#,
    ] {
        // GIVEN: A correctly signed token with a foreign header
        let token = forge_token(header, &claims, &keypair);

        // WHEN/THEN: The header is refused
        assert!(
            matches!(
                verifier().verify_at(&token, NOW),
                Err(TokenError::UnsupportedAlgorithm { .. })
            ),
            "{header}"
        );
    }
}

/// Test: Attacker signs with their own key but claims Alice's address
///
/// Attack: Present `sub` = victim address with attacker's `publicKey`
/// Defense: `sub` must be derived from `publicKey`
#[test]
fn test_identity_substitution_is_rejected() {
    // GIVEN: Bob's key and signature, Alice's address
    let attacker = bob();
    let claims = serde_json::json!({
        "sub": ALICE_ADDRESS,
        "publicKey": hex::encode(attacker.public_key_bytes()),
        "iat": NOW,
        "exp": NOW + 3600,
        "nonce": "n-1",
        "_protocol_metadata": { "version": "1.0.0" },
    })
    .to_string();
    let token = forge_token(r#"{"alg":"SR25519","typ":"JWT"}"#, &claims, &attacker);

    // WHEN: The token is verified
    let result = verifier().verify_at(&token, NOW);

    // THEN: The signature is fine but the subject binding is not
    assert!(matches!(result, Err(TokenError::SubjectKeyMismatch { .. })));
}

/// Test: Attacker embeds Alice's key but cannot sign for it
#[test]
fn test_borrowed_public_key_fails_signature() {
    // GIVEN: Alice's claims signed by Bob
    let claims = claims_json(&alice(), NOW, NOW + 3600, "n-1");
    let token = forge_token(r#"{"alg":"SR25519","typ":"JWT"}"#, &claims, &bob());

    // WHEN/THEN: The signature does not verify against Alice's key
    assert_eq!(
        verifier().verify_at(&token, NOW),
        Err(TokenError::InvalidSignature)
    );
}

/// Test: Signature moved from one token to another
#[test]
fn test_signature_splicing_is_rejected() {
    // GIVEN: Two tokens from the same signer
    let first = issue_at(&alice(), NOW);
    let second = issue_at(&alice(), NOW);
    let first_parts: Vec<&str> = first.as_str().split('.').collect();
    let second_parts: Vec<&str> = second.as_str().split('.').collect();

    // WHEN: The first token carries the second token's signature
    let spliced = format!("{}.{}.{}", first_parts[0], first_parts[1], second_parts[2]);

    // THEN: Verification fails
    assert_eq!(
        verifier().verify_at(&spliced, NOW),
        Err(TokenError::InvalidSignature)
    );
}

/// Test: Re-encoded claims with identical content still need the original bytes
#[test]
fn test_whitespace_reencoding_breaks_signature() {
    // GIVEN: A valid token whose claims are re-encoded with extra whitespace
    let issued = issue_at(&alice(), NOW);
    let parts: Vec<&str> = issued.as_str().split('.').collect();
    let pretty = serde_json::to_string_pretty(&issued.claims).unwrap();
    let reencoded = format!(
        "{}.{}.{}",
        parts[0],
        srtoken::segments::encode_segment(pretty.as_bytes()),
        parts[2]
    );

    // WHEN/THEN: The signature no longer matches
    assert_eq!(
        verifier().verify_at(&reencoded, NOW),
        Err(TokenError::InvalidSignature)
    );
}

/// Test: Unknown claim fields are tolerated but still signed
#[test]
fn test_unknown_claim_fields_are_ignored() {
    let keypair = alice();
    let mut claims: serde_json::Value =
        serde_json::from_str(&claims_json(&keypair, NOW, NOW + 3600, "n-1")).unwrap();
    claims["role"] = serde_json::json!("admin");
    let token = forge_token(
        r#"{"alg":"SR25519","typ":"JWT"}"#,
        &claims.to_string(),
        &keypair,
    );

    assert!(verifier().verify_at(&token, NOW).is_ok());
}

/// Test: Missing or invalid required claims are malformed
#[test]
fn test_invalid_claims_are_malformed() {
    let keypair = alice();
    let public_key = hex::encode(keypair.public_key_bytes());

    for claims in [
        serde_json::json!({ "sub": ALICE_ADDRESS, "iat": NOW, "exp": NOW + 10, "nonce": "n",
            "_protocol_metadata": { "version": "1.0.0" } }),
        serde_json::json!({ "sub": "", "publicKey": public_key, "iat": NOW, "exp": NOW + 10,
            "nonce": "n", "_protocol_metadata": { "version": "1.0.0" } }),
        serde_json::json!({ "sub": ALICE_ADDRESS, "publicKey": public_key, "iat": NOW,
            "exp": NOW, "nonce": "n", "_protocol_metadata": { "version": "1.0.0" } }),
        serde_json::json!({ "sub": ALICE_ADDRESS, "publicKey": "abcd", "iat": NOW,
            "exp": NOW + 10, "nonce": "n", "_protocol_metadata": { "version": "1.0.0" } }),
        serde_json::json!({ "sub": ALICE_ADDRESS, "publicKey": public_key, "iat": "now",
            "exp": NOW + 10, "nonce": "n", "_protocol_metadata": { "version": "1.0.0" } }),
    ] {
        let token = forge_token(r#"{"alg":"SR25519","typ":"JWT"}"#, &claims.to_string(), &keypair);
        assert!(
            matches!(
                verifier().verify_at(&token, NOW),
                Err(TokenError::MalformedToken { .. })
            ),
            "{claims}"
        );
    }
}

/// Test: Claims from an unknown protocol version
#[test]
fn test_unknown_protocol_version() {
    let keypair = alice();
    let claims = claims_json(&keypair, NOW, NOW + 3600, "n-1").replace("1.0.0", "9.9.9");
    let token = forge_token(r#"{"alg":"SR25519","typ":"JWT"}"#, &claims, &keypair);

    assert_eq!(
        verifier().verify_at(&token, NOW),
        Err(TokenError::UnsupportedProtocolVersion {
            version: "9.9.9".to_string()
        })
    );
}

/// Test: Pinned trust anchor only accepts its own key
#[test]
fn test_anchored_trust_rejects_self_asserted_identities() {
    // GIVEN: A verifier pinned to Alice's key
    let anchored = TokenVerifier::new(VerifierConfig::default(), scheme())
        .with_trust(KeyTrust::Anchored(alice().public_key()));

    // WHEN/THEN: Alice's token is accepted
    assert!(anchored.verify_at(issue_at(&alice(), NOW).as_str(), NOW).is_ok());

    // WHEN/THEN: Bob's perfectly valid self-asserted token is not
    assert_eq!(
        anchored.verify_at(issue_at(&bob(), NOW).as_str(), NOW),
        Err(TokenError::InvalidSignature)
    );
}

/// Test: The pinned key cannot vouch for another identity
#[test]
fn test_anchored_key_cannot_sign_for_another_public_key() {
    // GIVEN: A verifier pinned to Alice's key
    let anchored = TokenVerifier::new(VerifierConfig::default(), scheme())
        .with_trust(KeyTrust::Anchored(alice().public_key()));

    // WHEN: Alice signs claims naming Bob's key and address
    let claims = claims_json(&bob(), NOW, NOW + 3600, "anchored-substitution");
    let token = forge_token(r#"{"alg":"SR25519","typ":"JWT"}"#, &claims, &alice());

    // THEN: The signature verifies but the claimed key is not the anchor
    assert!(matches!(
        anchored.verify_at(&token, NOW),
        Err(TokenError::SubjectKeyMismatch { .. })
    ));
}

/// Test: Padded base64 segments are refused
#[test]
fn test_padded_segments_are_malformed() {
    let issued = issue_at(&alice(), NOW);
    let parts: Vec<&str> = issued.as_str().split('.').collect();
    let padded = format!("{}.{}.{}==", parts[0], parts[1], parts[2]);

    assert!(matches!(
        verifier().verify_at(&padded, NOW),
        Err(TokenError::MalformedToken { .. })
    ));
}

proptest! {
    /// Arbitrary strings are rejected with a structural or algorithm error, never a panic
    #[test]
    fn prop_garbage_is_rejected(input in ".{0,256}") {
        match verifier().verify_at(&input, NOW) {
            Err(TokenError::MalformedToken { .. } | TokenError::UnsupportedAlgorithm { .. }) => {}
            other => prop_assert!(false, "unexpected result {:?}", other),
        }
    }

    /// Three dot-separated base64url-looking segments are still rejected
    #[test]
    fn prop_random_segments_are_rejected(
        header in "[A-Za-z0-9_-]{1,64}",
        claims in "[A-Za-z0-9_-]{1,128}",
        signature in "[A-Za-z0-9_-]{1,96}",
    ) {
        let token = format!("{header}.{claims}.{signature}");
        prop_assert!(verifier().verify_at(&token, NOW).is_err());
    }
}

//! Token error taxonomy
//!
//! Every verification failure is terminal and surfaced as its own variant. The
//! distinction is for logging and tests; transports must not reveal it to callers.

use thiserror::Error;

/// Errors produced while issuing, parsing, verifying or validating tokens
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Structural or encoding violation (segment count, base64, JSON, required fields)
    #[error("Malformed token: {reason}")]
    MalformedToken { reason: String },

    /// Header declares a scheme or type other than the one accepted
    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// Claims carry a protocol version this verifier does not understand
    #[error("Unsupported protocol version: {version}")]
    UnsupportedProtocolVersion { version: String },

    /// Signature does not verify against the signing input
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Current time is at or past `exp`
    #[error("Token expired at {expired_at} (now {now})")]
    TokenExpired { expired_at: u64, now: u64 },

    /// `iat` lies further in the future than the clock skew allows
    #[error("Token issued in the future: iat {issued_at}, now {now}, skew {max_skew_seconds}s")]
    TokenNotYetValid {
        issued_at: u64,
        now: u64,
        max_skew_seconds: u64,
    },

    /// Token is older than the configured maximum age
    #[error("Token exceeds maximum age: {age_seconds}s old, maximum {max_age_seconds}s")]
    TokenTooOld {
        age_seconds: u64,
        max_age_seconds: u64,
    },

    /// `publicKey` does not derive `sub`, or differs from the pinned key
    #[error("Subject/key mismatch: {reason}")]
    SubjectKeyMismatch { reason: String },

    /// Nonce was already accepted once
    #[error("Replay detected for nonce {nonce}")]
    ReplayDetected { nonce: String },

    /// Issuer refused claims that break the data model
    #[error("Invalid claims: {reason}")]
    InvalidClaims { reason: String },

    /// Recovery phrase, seed or key bytes could not be turned into a key
    #[error("Key derivation failed: {reason}")]
    KeyDerivation { reason: String },

    /// Signing capability failed or produced an unusable signature
    #[error("Signing failed: {reason}")]
    Signing { reason: String },

    /// Environment failure (clock, cache capacity)
    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl TokenError {
    /// Create a malformed-token error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }

    /// Stable category string for logs and metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedToken { .. } => "malformed_token",
            Self::UnsupportedAlgorithm { .. } => "unsupported_algorithm",
            Self::UnsupportedProtocolVersion { .. } => "unsupported_protocol_version",
            Self::InvalidSignature => "invalid_signature",
            Self::TokenExpired { .. } => "token_expired",
            Self::TokenNotYetValid { .. } => "token_not_yet_valid",
            Self::TokenTooOld { .. } => "token_too_old",
            Self::SubjectKeyMismatch { .. } => "subject_key_mismatch",
            Self::ReplayDetected { .. } => "replay_detected",
            Self::InvalidClaims { .. } => "invalid_claims",
            Self::KeyDerivation { .. } => "key_derivation",
            Self::Signing { .. } => "signing",
            Self::Internal { .. } => "internal",
        }
    }

    /// Whether this error rejects a presented token (as opposed to an issuer or
    /// environment failure)
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken { .. }
                | Self::UnsupportedAlgorithm { .. }
                | Self::UnsupportedProtocolVersion { .. }
                | Self::InvalidSignature
                | Self::TokenExpired { .. }
                | Self::TokenNotYetValid { .. }
                | Self::TokenTooOld { .. }
                | Self::SubjectKeyMismatch { .. }
                | Self::ReplayDetected { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categorization() {
        let expired = TokenError::TokenExpired {
            expired_at: 10,
            now: 10,
        };
        assert!(expired.is_authentication_failure());
        assert_eq!(expired.category(), "token_expired");

        let signing = TokenError::Signing {
            reason: "hsm offline".to_string(),
        };
        assert!(!signing.is_authentication_failure());
        assert_eq!(signing.category(), "signing");
    }

    #[test]
    fn test_error_display() {
        let error = TokenError::malformed("expected 3 segments, got 2");
        assert_eq!(
            error.to_string(),
            "Malformed token: expected 3 segments, got 2"
        );

        let error = TokenError::UnsupportedAlgorithm {
            algorithm: "HS256".to_string(),
        };
        assert!(error.to_string().contains("HS256"));
    }
}

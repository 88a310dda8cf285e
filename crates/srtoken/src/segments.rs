//! Token segment codec
//!
//! A token is `base64url(header) "." base64url(claims) "." base64url(signature)`
//! with the unpadded URL-safe alphabet. Decoding is strict: padding, characters
//! outside the alphabet and non-canonical trailing bits are rejected.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::{Result, errors::TokenError};

const SEGMENT_SEPARATOR: char = '.';

/// Encode bytes as one unpadded base64url segment
#[must_use]
pub fn encode_segment(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode one unpadded base64url segment
pub fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::malformed(format!("{name} segment is not valid base64url: {e}")))
}

/// Join already encoded segments into a token string
#[must_use]
pub fn assemble(header: &str, claims: &str, signature: &str) -> String {
    let mut token = String::with_capacity(header.len() + claims.len() + signature.len() + 2);
    token.push_str(header);
    token.push(SEGMENT_SEPARATOR);
    token.push_str(claims);
    token.push(SEGMENT_SEPARATOR);
    token.push_str(signature);
    token
}

/// Token split into its three encoded segments, borrowed from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken<'a> {
    header: &'a str,
    claims: &'a str,
    signature: &'a str,
}

impl<'a> RawToken<'a> {
    /// Split a token into exactly three non-empty segments
    pub fn parse(token: &'a str) -> Result<Self> {
        let mut parts = token.split(SEGMENT_SEPARATOR);
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            let count = token.split(SEGMENT_SEPARATOR).count();
            return Err(TokenError::malformed(format!(
                "expected 3 segments, got {count}"
            )));
        };

        for (name, segment) in [("header", header), ("claims", claims), ("signature", signature)] {
            if segment.is_empty() {
                return Err(TokenError::malformed(format!("{name} segment is empty")));
            }
        }

        Ok(Self {
            header,
            claims,
            signature,
        })
    }

    /// Encoded header segment
    #[must_use]
    pub fn header(&self) -> &'a str {
        self.header
    }

    /// Encoded claims segment
    #[must_use]
    pub fn claims(&self) -> &'a str {
        self.claims
    }

    /// Encoded signature segment
    #[must_use]
    pub fn signature(&self) -> &'a str {
        self.signature
    }

    /// Exact bytes covered by the signature: `header "." claims` as received
    #[must_use]
    pub fn signing_input(&self) -> Vec<u8> {
        let mut input = Vec::with_capacity(self.header.len() + self.claims.len() + 1);
        input.extend_from_slice(self.header.as_bytes());
        input.push(b'.');
        input.extend_from_slice(self.claims.as_bytes());
        input
    }
}

/// Bytes to sign for freshly encoded segments
#[must_use]
pub fn signing_input(header: &str, claims: &str) -> Vec<u8> {
    RawToken {
        header,
        claims,
        signature: "",
    }
    .signing_input()
}

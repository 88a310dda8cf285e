//! `Authorization: Bearer` boundary for transport layers
//!
//! Transports only learn whether a request is authenticated. Every
//! [`TokenError`](crate::TokenError) collapses into [`Unauthenticated`] here; the
//! specific reason is logged, never returned.

use std::sync::Arc;

use http::{HeaderMap, HeaderName, StatusCode, header::AUTHORIZATION};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Result, types::VerifiedIdentity, verifier::TokenVerifier};

const BEARER_SCHEME: &str = "Bearer";

/// Opaque authentication failure returned to transports
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("unauthenticated")]
pub struct Unauthenticated;

impl Unauthenticated {
    /// HTTP status for the failure
    #[must_use]
    pub fn status(self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    /// `WWW-Authenticate` challenge value
    #[must_use]
    pub fn challenge(self) -> &'static str {
        BEARER_SCHEME
    }
}

/// Anything able to turn a bearer token into a verified identity
pub trait VerifyToken: Send + Sync {
    /// Verify a token
    fn verify_token(&self, token: &str) -> Result<VerifiedIdentity>;
}

impl VerifyToken for TokenVerifier {
    fn verify_token(&self, token: &str) -> Result<VerifiedIdentity> {
        self.verify(token)
    }
}

impl<T: VerifyToken + ?Sized> VerifyToken for Arc<T> {
    fn verify_token(&self, token: &str) -> Result<VerifiedIdentity> {
        (**self).verify_token(token)
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// The scheme name is matched case-insensitively. Missing, repeated or
/// non-ASCII headers, other schemes and empty tokens are all rejected.
pub fn extract_bearer(headers: &HeaderMap) -> std::result::Result<&str, Unauthenticated> {
    extract_bearer_from(headers, &AUTHORIZATION)
}

/// Extract a bearer token carried in `header_name` instead of `Authorization`
pub fn extract_bearer_from<'a>(
    headers: &'a HeaderMap,
    header_name: &HeaderName,
) -> std::result::Result<&'a str, Unauthenticated> {
    let mut values = headers.get_all(header_name).iter();
    let (Some(value), None) = (values.next(), values.next()) else {
        debug!(header = %header_name, "Missing or repeated credentials header");
        return Err(Unauthenticated);
    };

    let value = value.to_str().map_err(|_| {
        debug!("Credentials header is not visible ASCII");
        Unauthenticated
    })?;

    let Some((scheme, token)) = value.trim().split_once(' ') else {
        debug!("Credentials header has no token");
        return Err(Unauthenticated);
    };
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        debug!(scheme, "Unsupported authorization scheme");
        return Err(Unauthenticated);
    }

    let token = token.trim_start();
    if token.is_empty() || token.contains(char::is_whitespace) {
        debug!("Bearer credentials are empty or contain whitespace");
        return Err(Unauthenticated);
    }
    Ok(token)
}

/// Authenticates requests from their headers
#[derive(Debug, Clone)]
pub struct BearerAuthenticator<V> {
    verifier: V,
    header_name: HeaderName,
}

impl<V: VerifyToken> BearerAuthenticator<V> {
    /// Wrap a verifier
    pub fn new(verifier: V) -> Self {
        Self {
            verifier,
            header_name: AUTHORIZATION,
        }
    }

    /// Read credentials from `header_name` instead of `Authorization`
    #[must_use]
    pub fn with_header_name(mut self, header_name: HeaderName) -> Self {
        self.header_name = header_name;
        self
    }

    /// Header carrying the credentials
    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    /// Underlying verifier
    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Authenticate a request
    ///
    /// The verifier is not invoked unless a well-formed bearer header is present.
    pub fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> std::result::Result<VerifiedIdentity, Unauthenticated> {
        let token = extract_bearer_from(headers, &self.header_name)?;
        self.verifier.verify_token(token).map_err(|e| {
            warn!(category = e.category(), "Bearer authentication failed");
            Unauthenticated
        })
    }
}

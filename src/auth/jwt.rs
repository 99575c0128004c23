//! JWT Token Codec
//! Mission: Mint and verify signed, time-bounded session tokens

use crate::auth::models::{Claims, Identity, TokenKind, UserRole};
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Verification failure. Forged, malformed, and expired tokens all collapse
/// here so downstream logic treats them like "no token".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token invalid, malformed, or expired")]
    Invalid,
}

/// Codec for access and refresh tokens, HMAC-SHA256 signed.
///
/// The signing secret is read-only after construction; the codec is safe to
/// share across tasks behind an `Arc` with no further synchronization.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Mint a signed token for the given identity.
    ///
    /// The role claim is embedded only on access tokens; refresh tokens
    /// carry the subject alone.
    pub fn mint(&self, identity: &Identity, kind: TokenKind) -> Result<String> {
        let now = Utc::now().timestamp() as usize;
        let lifetime = self.lifetime(kind);

        let claims = Claims {
            sub: identity.subject_id.clone(),
            role: match kind {
                TokenKind::Access => Some(identity.role.clone()),
                TokenKind::Refresh => None,
            },
            iat: now,
            exp: now + lifetime.as_secs() as usize,
        };

        debug!(
            subject = %identity.subject_id,
            kind = kind.as_str(),
            lifetime_secs = lifetime.as_secs(),
            "Minting token"
        );

        encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to sign token")
    }

    /// Verify signature and expiry, returning the subject identifier.
    ///
    /// Expiry is exact: no leeway window. Never panics; every failure mode
    /// maps to `TokenError::Invalid`.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        Ok(self.decode_claims(token)?.sub)
    }

    /// Verify the token and extract its role claim.
    ///
    /// A structurally valid refresh token has no role claim and is Invalid
    /// for this call only.
    pub fn extract_role(&self, token: &str) -> Result<UserRole, TokenError> {
        self.decode_claims(token)?.role.ok_or(TokenError::Invalid)
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0; // expiry is exact

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| TokenError::Invalid)
    }
}

//! Auth Gateway
//! Mission: Orchestrate login, refresh rotation, and logout

use crate::auth::jwt::TokenCodec;
use crate::auth::models::{Identity, TokenKind, TokenPair};
use crate::auth::session::SessionStore;
use crate::auth::user_store::UserStore;
use crate::store::StoreError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Auth failure taxonomy. The API layer collapses the first four onto one
/// generic unauthorized wire response; the distinction exists for logs.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("token invalid, unsigned, or expired")]
    InvalidToken,
    #[error("session expired, superseded, or revoked")]
    SessionExpired,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Login / refresh / logout orchestration.
///
/// The gateway is the sole writer of session records: it mints tokens, then
/// records them as live *before* returning them, so a caller never holds a
/// token the store does not know about.
pub struct AuthGateway {
    users: Arc<UserStore>,
    codec: Arc<TokenCodec>,
    sessions: SessionStore,
}

impl AuthGateway {
    pub fn new(users: Arc<UserStore>, codec: Arc<TokenCodec>, sessions: SessionStore) -> Self {
        Self {
            users,
            codec,
            sessions,
        }
    }

    /// Mint a fresh pair for `identity` and register both tokens, replacing
    /// whatever session the subject had. Store-then-return ordering.
    async fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        let access_token = self.codec.mint(identity, TokenKind::Access)?;
        let refresh_token = self.codec.mint(identity, TokenKind::Refresh)?;

        self.sessions
            .put(
                TokenKind::Access,
                &identity.subject_id,
                &access_token,
                self.codec.access_ttl(),
            )
            .await?;
        self.sessions
            .put(
                TokenKind::Refresh,
                &identity.subject_id,
                &refresh_token,
                self.codec.refresh_ttl(),
            )
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Validate credentials and open a session.
    ///
    /// A successful login overwrites any prior session for the subject:
    /// single active session per subject, which is what makes logout an
    /// instant revocation with no deny-list.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .map_err(AuthError::Internal)?
            .ok_or(AuthError::InvalidCredentials)?;

        let valid = self
            .users
            .verify_password(&user, password)
            .map_err(AuthError::Internal)?;
        if !valid {
            warn!(email = %email, "Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = user.identity();
        let pair = self.issue_pair(&identity).await?;

        info!(subject = %identity.subject_id, role = identity.role.as_str(), "✅ Login successful");
        Ok(pair)
    }

    /// Rotate a refresh token into a new pair. The presented token is
    /// single-use: once rotated, replaying it fails `SessionExpired`
    /// because it no longer matches the stored value.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let subject_id = self
            .codec
            .verify(refresh_token)
            .map_err(|_| AuthError::InvalidToken)?;

        let live = self
            .sessions
            .is_live(TokenKind::Refresh, &subject_id, refresh_token)
            .await?;
        if !live {
            // Superseded by a newer login/refresh, explicitly logged out,
            // or lapsed by TTL - all one error kind.
            warn!(subject = %subject_id, "Refresh token no longer live");
            return Err(AuthError::SessionExpired);
        }

        // Re-resolve the identity: the role may have changed since mint.
        let user = self
            .users
            .find_by_id(&subject_id)
            .map_err(AuthError::Internal)?
            .ok_or(AuthError::UserNotFound)?;

        let pair = self.issue_pair(&user.identity()).await?;

        info!(subject = %subject_id, "🔄 Session refreshed");
        Ok(pair)
    }

    /// Close the subject's session. Idempotent by design: an unparseable or
    /// stale token means there is nothing left to revoke, which is success.
    pub async fn logout(&self, token: &str) {
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();

        let subject_id = match self.codec.verify(token) {
            Ok(subject_id) => subject_id,
            Err(_) => return, // already logged out as far as we care
        };

        if let Err(e) = self.sessions.revoke(TokenKind::Access, &subject_id).await {
            warn!(subject = %subject_id, error = %e, "Failed to revoke access entry");
        }
        if let Err(e) = self.sessions.revoke(TokenKind::Refresh, &subject_id).await {
            warn!(subject = %subject_id, error = %e, "Failed to revoke refresh entry");
        }

        info!(subject = %subject_id, "👋 Logged out");
    }
}

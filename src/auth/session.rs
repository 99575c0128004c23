//! Session Store
//! Mission: Track the single currently-valid token per subject per kind

use crate::auth::models::TokenKind;
use crate::store::{StoreError, TtlStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Revocable per-subject session records.
///
/// Each subject owns at most one live access token and one live refresh
/// token; `put` overwrites unconditionally, which is what makes a new
/// login or refresh invalidate the previous session without a deny-list.
///
/// Every backend round-trip is bounded by `op_timeout` and surfaces
/// `StoreError::Unavailable` instead of hanging the request.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn TtlStore>,
    op_timeout: Duration,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn TtlStore>, op_timeout: Duration) -> Self {
        Self {
            backend,
            op_timeout,
        }
    }

    fn key(kind: TokenKind, subject_id: &str) -> String {
        format!("{}:{}", kind.as_str(), subject_id)
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| StoreError::Unavailable("session store call timed out".to_string()))?
    }

    /// Record `token` as the sole live token of `kind` for the subject.
    /// Last writer wins; the previous value is gone.
    pub async fn put(
        &self,
        kind: TokenKind,
        subject_id: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let key = Self::key(kind, subject_id);
        debug!(key = %key, ttl_secs = ttl.as_secs(), "Storing session token");
        self.bounded(self.backend.set(&key, token, ttl)).await
    }

    /// True iff the stored value for `(kind, subject)` exists and equals
    /// `token` exactly. Plain equality: the token itself is the unforgeable
    /// credential, this is an administrative liveness check.
    pub async fn is_live(
        &self,
        kind: TokenKind,
        subject_id: &str,
        token: &str,
    ) -> Result<bool, StoreError> {
        let key = Self::key(kind, subject_id);
        let stored = self.bounded(self.backend.get(&key)).await?;
        Ok(stored.as_deref() == Some(token))
    }

    /// Delete the subject's entry of `kind`. Idempotent.
    pub async fn revoke(&self, kind: TokenKind, subject_id: &str) -> Result<(), StoreError> {
        let key = Self::key(kind, subject_id);
        debug!(key = %key, "Revoking session token");
        self.bounded(self.backend.delete(&key)).await
    }
}

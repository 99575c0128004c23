//! Request Authenticator
//! Mission: Gate every non-public route behind a live bearer token

use crate::auth::jwt::TokenCodec;
use crate::auth::models::{ApiResponse, TokenKind, UserRole};
use crate::auth::session::SessionStore;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Routes that pass through unauthenticated.
const PUBLIC_PATHS: &[&str] = &["/auth/login", "/auth/refresh", "/auth/logout", "/health"];

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// Authenticated identity bound to the request after the middleware runs.
/// Downstream handlers read this from extensions instead of re-verifying.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub subject_id: String,
    pub role: Option<UserRole>,
}

/// State carried by the authenticator layer.
#[derive(Clone)]
pub struct AuthenticatorState {
    pub codec: Arc<TokenCodec>,
    pub sessions: SessionStore,
}

/// Per-request bearer-token check, run after rate admission and before
/// any business handler.
///
/// Verification failure and revocation are logged with distinct reasons
/// but share one wire response, so a caller cannot probe which one it hit.
pub async fn authenticate(
    State(state): State<AuthenticatorState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    let path = req.uri().path().to_string();
    if is_public(&path) {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .ok_or(AuthRejection::MissingToken)?;

    let subject_id = state.codec.verify(&token).map_err(|_| {
        warn!(path = %path, "Rejected request: token malformed or expired");
        AuthRejection::Unauthorized
    })?;

    let live = state
        .sessions
        .is_live(TokenKind::Access, &subject_id, &token)
        .await
        .map_err(|e| {
            // Store trouble is not "not authenticated" - never collapse them
            warn!(path = %path, error = %e, "Session store unavailable during auth");
            AuthRejection::StoreUnavailable
        })?;
    if !live {
        warn!(subject = %subject_id, path = %path, "Rejected request: token revoked or superseded");
        return Err(AuthRejection::Unauthorized);
    }

    let role = state.codec.extract_role(&token).ok();
    req.extensions_mut().insert(AuthContext { subject_id, role });

    Ok(next.run(req).await)
}

/// Rejection responses emitted by the authenticator.
#[derive(Debug)]
pub enum AuthRejection {
    MissingToken,
    Unauthorized,
    StoreUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthRejection::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Missing or invalid Authorization header",
            ),
            AuthRejection::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Token is not valid or has been revoked",
            ),
            AuthRejection::StoreUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Authentication service temporarily unavailable",
            ),
        };

        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}

//! Authentication API Endpoints
//! Mission: Expose login, refresh, and logout over HTTP

use crate::auth::gateway::{AuthError, AuthGateway};
use crate::auth::middleware::{authenticate, AuthContext, AuthenticatorState};
use crate::auth::models::{ApiResponse, LoginRequest, RefreshRequest, TokenPair};
use crate::middleware::logging::request_logging;
use crate::middleware::rate_limit::{rate_limit_middleware, RateAdmission};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

/// Shared auth state for the handlers
#[derive(Clone)]
pub struct AuthState {
    pub gateway: Arc<AuthGateway>,
}

/// Login endpoint - POST /auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, AuthApiError> {
    let pair = state.gateway.login(&payload.email, &payload.password).await?;
    Ok(Json(ApiResponse::ok(pair, "Login successful")))
}

/// Refresh endpoint - POST /auth/refresh
pub async fn refresh(
    State(state): State<AuthState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, AuthApiError> {
    let pair = state.gateway.refresh(&payload.refresh_token).await?;
    Ok(Json(ApiResponse::ok(pair, "Token refreshed successfully")))
}

/// Logout endpoint - POST /auth/logout
///
/// Always 200: a token we cannot parse is a session that is already gone.
pub async fn logout(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Json<ApiResponse<()>> {
    if let Some(token) = headers.get("Authorization").and_then(|h| h.to_str().ok()) {
        state.gateway.logout(token).await;
    }
    Json(ApiResponse::ok((), "Successfully logged out"))
}

/// Current identity - GET /api/auth/me
///
/// Reads the identity bound by the authenticator; no directory lookup.
pub async fn me(Extension(ctx): Extension<AuthContext>) -> Json<ApiResponse<AuthContext>> {
    Json(ApiResponse::ok(ctx, "OK"))
}

/// Liveness probe - GET /health
pub async fn health() -> Json<ApiResponse<()>> {
    Json(ApiResponse::ok((), "OK"))
}

/// Assemble the full application router.
///
/// Layer order (outermost first): rate admission, then authentication,
/// then the handlers. Middleware layers run before any handler executes.
pub fn build_router(
    auth_state: AuthState,
    authenticator: AuthenticatorState,
    admission: Arc<RateAdmission>,
) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/health", get(health))
        .with_state(auth_state)
        .layer(middleware::from_fn_with_state(authenticator, authenticate))
        .layer(middleware::from_fn_with_state(
            admission,
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
}

/// Wire-level auth error.
///
/// Credential, token, and session failures all surface as one generic 401
/// so the response does not leak which check failed; the log line carries
/// the real reason. Store unavailability is a 5xx, never a 401.
#[derive(Debug)]
pub struct AuthApiError(AuthError);

impl From<AuthError> for AuthApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::SessionExpired
            | AuthError::UserNotFound => {
                warn!(reason = %self.0, "Authentication refused");
                (StatusCode::UNAUTHORIZED, "Unauthorized")
            }
            AuthError::StoreUnavailable(e) => {
                error!(error = %e, "Session store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Authentication service temporarily unavailable",
                )
            }
            AuthError::Internal(e) => {
                error!(error = %e, "Internal auth error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(ApiResponse::<()>::err(message))).into_response()
    }
}

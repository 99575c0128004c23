//! Rate admission middleware.
//!
//! Fixed-window request counting per client IP, backed by the shared TTL
//! store's atomic increment. Runs before authentication.

use crate::auth::models::ApiResponse;
use crate::store::{StoreError, TtlStore};
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Configuration for rate admission.
#[derive(Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u64,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
        }
    }
}

/// Admission decision for one request.
#[derive(Debug, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied,
}

/// Fixed-window counter over the shared TTL store.
///
/// Fixed-window, not sliding: the boundary burst (up to 2x the ceiling
/// across a window edge) is an accepted simplicity/throughput tradeoff.
pub struct RateAdmission {
    config: RateLimitConfig,
    backend: Arc<dyn TtlStore>,
    op_timeout: Duration,
}

impl RateAdmission {
    pub fn new(config: RateLimitConfig, backend: Arc<dyn TtlStore>, op_timeout: Duration) -> Self {
        Self {
            config,
            backend,
            op_timeout,
        }
    }

    /// Count this request against the address and decide.
    ///
    /// The backend sets the window TTL when the counter is created; a
    /// denied request causes no side effects beyond the increment itself.
    ///
    /// Policy on store failure: fail-open. Admission is throughput
    /// protection, not the security boundary, so an unavailable counter
    /// store degrades to "no limiting" rather than refusing all traffic.
    pub async fn admit(&self, addr: IpAddr) -> Admission {
        let key = format!("ratelimit:{}", addr);

        let count = tokio::time::timeout(
            self.op_timeout,
            self.backend.increment(&key, self.config.window),
        )
        .await
        .map_err(|_| StoreError::Unavailable("rate counter call timed out".to_string()))
        .and_then(|r| r);

        match count {
            Ok(count) if count > self.config.max_requests => Admission::Denied,
            Ok(_) => Admission::Allowed,
            Err(e) => {
                warn!(ip = %addr, error = %e, "Rate counter unavailable, admitting (fail-open)");
                Admission::Allowed
            }
        }
    }
}

/// Rate admission middleware function.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(admission): State<Arc<RateAdmission>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = addr.ip();

    match admission.admit(ip).await {
        Admission::Allowed => next.run(request).await,
        Admission::Denied => {
            warn!(ip = %ip, "Rate limit exceeded");

            (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", admission.config.window.as_secs().to_string())],
                axum::Json(ApiResponse::<()>::err(
                    "Too many requests. Please try again later.",
                )),
            )
                .into_response()
        }
    }
}

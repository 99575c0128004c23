//! Middleware for observability and rate admission.
//!
//! This module provides:
//! - Request logging with latency tracking
//! - Fixed-window rate admission per IP address

pub mod logging;
pub mod rate_limit;

pub use logging::request_logging;
pub use rate_limit::{Admission, RateAdmission, RateLimitConfig};

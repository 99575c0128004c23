//! CampusHub Backend Library
//!
//! Authentication and session-control core of the school-management
//! backend: token codec, revocable session store, rate admission, and the
//! HTTP surface that fronts them. Exposed as a library so the binary and
//! integration tests assemble the same router.

pub mod auth;
pub mod config;
pub mod middleware;
pub mod store;

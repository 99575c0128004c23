//! Runtime configuration.
//!
//! Everything operational comes from the environment; the signing secret
//! has no shipped default and startup fails without it.

use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub rate_limit_max: u64,
    pub rate_limit_window: Duration,
    pub store_timeout: Duration,
    pub user_db_path: String,
}

fn env_u64(var: &str, default: u64) -> u64 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .context("Invalid BIND_ADDR")?;

        let jwt_secret = env::var("JWT_SECRET")
            .context("JWT_SECRET must be set (no default is shipped)")?;

        Ok(Self {
            bind_addr,
            jwt_secret,
            access_token_ttl: Duration::from_secs(env_u64("ACCESS_TOKEN_TTL_SECS", 15 * 60)),
            refresh_token_ttl: Duration::from_secs(env_u64(
                "REFRESH_TOKEN_TTL_SECS",
                7 * 24 * 3600,
            )),
            rate_limit_max: env_u64("RATE_LIMIT_MAX_REQUESTS", 60),
            rate_limit_window: Duration::from_secs(env_u64("RATE_LIMIT_WINDOW_SECS", 60)),
            store_timeout: Duration::from_millis(env_u64("STORE_TIMEOUT_MS", 2000)),
            user_db_path: env::var("USER_DB_PATH")
                .unwrap_or_else(|_| "campushub_users.db".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_u64_parsing() {
        env::set_var("TEST_ENV_U64_OK", "42");
        env::set_var("TEST_ENV_U64_BAD", "not-a-number");
        env::set_var("TEST_ENV_U64_ZERO", "0");

        assert_eq!(env_u64("TEST_ENV_U64_OK", 7), 42);
        assert_eq!(env_u64("TEST_ENV_U64_BAD", 7), 7);
        // Zero would disable the mechanism entirely; fall back instead
        assert_eq!(env_u64("TEST_ENV_U64_ZERO", 7), 7);
        assert_eq!(env_u64("TEST_ENV_U64_MISSING", 7), 7);
    }
}

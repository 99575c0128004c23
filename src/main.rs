//! CampusHub - School Management Backend
//! Mission: Authentication and session control for the campus API

use anyhow::{Context, Result};
use campushub_backend::{
    auth::{
        api::build_router, AuthGateway, AuthState, AuthenticatorState, SessionStore, TokenCodec,
        UserStore,
    },
    config::Config,
    middleware::{RateAdmission, RateLimitConfig},
    store::{MemoryStore, TtlStore},
};
use dotenv::dotenv;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("🏫 CampusHub backend starting");

    // All components are constructed here and injected explicitly; there
    // is no global registry.
    let store = Arc::new(MemoryStore::new());
    let backend: Arc<dyn TtlStore> = store.clone();

    let codec = Arc::new(TokenCodec::new(
        &config.jwt_secret,
        config.access_token_ttl,
        config.refresh_token_ttl,
    ));
    let sessions = SessionStore::new(backend.clone(), config.store_timeout);
    let users = Arc::new(UserStore::new(&config.user_db_path)?);

    info!("🔐 User directory initialized at: {}", config.user_db_path);

    let gateway = Arc::new(AuthGateway::new(
        users,
        codec.clone(),
        sessions.clone(),
    ));

    let admission = Arc::new(RateAdmission::new(
        RateLimitConfig {
            max_requests: config.rate_limit_max,
            window: config.rate_limit_window,
        },
        backend,
        config.store_timeout,
    ));

    // Drop entries the lazy expiry never revisits
    let purge_store = store.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            purge_store.purge_expired();
        }
    });

    let app = build_router(
        AuthState { gateway },
        AuthenticatorState { codec, sessions },
        admission,
    );

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("🎯 API server listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campushub_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

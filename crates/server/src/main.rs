//! cachegate server entry point.
//!
//! Boots the HTTP gateway: loads configuration, opens the record database
//! and object store, wires the resolver, and serves until interrupted.
//! Logging goes to stderr so stdout stays clean for process supervisors.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use cachegate_client::{FetchClient, FetchConfig, HttpRelocator, ObjectStore};
use cachegate_core::config::AppConfig;
use cachegate_core::store::CacheDb;
use cachegate_core::Resolver;

mod http;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open record database at {}", config.db_path.display()))?;

    let objects = ObjectStore::open(&config.store_root, &config.bucket, &config.public_base_url)
        .await
        .context("failed to open object store")?;

    let fetch = FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        max_redirects: config.max_redirects,
        ..FetchConfig::default()
    })
    .context("failed to build fetch client")?;

    let relocator = HttpRelocator::new(fetch, objects.clone());
    let resolver = Resolver::new(Arc::new(db.clone()), Arc::new(relocator));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("cachegate listening on {}", addr);

    let state = Arc::new(http::AppState { config, resolver, objects });

    tokio::select! {
        result = http::run(state, listener) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    db.close().await.context("failed to close record database")?;

    Ok(())
}

mod aggregator;
mod cache;
mod config;
mod error;
mod hn_client;
mod models;
mod refresher;
mod server;
mod service;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::hn_client::HackerNewsClient;
use crate::refresher::spawn_refresher;
use crate::service::TopStories;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hn_top_stories=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::parse();
    config.validate()?;

    let client = HackerNewsClient::new(&config.api_base, config.fetch_timeout())
        .context("failed to create the Hacker News client")?;
    let api_base = client.base_url().clone();
    let service = Arc::new(TopStories::new(Arc::new(client), config.settings()));

    let shutdown = CancellationToken::new();
    let refresher = spawn_refresher(Arc::clone(&service), config.refresh_every(), shutdown.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(
        %addr,
        api = %api_base,
        num_stories = config.num_stories,
        cache_ttl = config.cache_ttl,
        refresh_interval = config.refresh_interval,
        "serving top stories"
    );

    axum::serve(listener, server::router(service))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    refresher.await?;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                tracing::warn!(error = %err, "could not listen for ctrl-c");
                // Keep serving; only an explicit cancel stops us now
                shutdown.cancelled().await;
                return;
            }
            info!("shutting down");
            shutdown.cancel();
        }
        _ = shutdown.cancelled() => {}
    }
}

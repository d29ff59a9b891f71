//! # SAML Identity Provider
//!
//! Main entry point for the identity provider server.

#![forbid(unsafe_code)]

use idp_server::{IdpConfig, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("SAML identity provider starting...");

    let config = IdpConfig::from_env()?;
    let server = Server::new(config)?;
    server.run().await
}

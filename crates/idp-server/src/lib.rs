//! # idp-server
//!
//! HTTP front end for the SAML 2.0 identity provider.
//!
//! This crate serves:
//! - SAML endpoints: metadata, single sign-on and single logout over the
//!   HTTP-Redirect binding, answering with HTTP-POST auto-submit forms
//! - Browser pages: login, sign-out and a landing page
//! - A health check
//!
//! ## Usage
//!
//! ```ignore
//! use idp_server::{IdpConfig, Server};
//!
//! let config = IdpConfig::from_env()?;
//! let server = Server::new(config)?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod directory;
pub mod router;
pub mod saml_handlers;
pub mod session;
pub mod state;
pub mod ui;

pub use config::IdpConfig;
pub use directory::{StaticUserDirectory, UserDirectory};
pub use router::create_router;
pub use state::AppState;

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

/// The identity provider server.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Creates a new server instance.
    ///
    /// Fails if the configured key pair cannot sign.
    pub fn new(config: IdpConfig) -> anyhow::Result<Self> {
        let state = AppState::new(config)?;

        tracing::info!(
            entity_id = %state.config.entity_id,
            users = state.config.users.len(),
            "Signing key loaded"
        );

        Ok(Self { state })
    }

    /// Creates a server over an already built state.
    #[must_use]
    pub const fn with_state(state: AppState) -> Self {
        Self { state }
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.state.config();
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on http://{}", listener.local_addr()?);
        tracing::info!("Single sign-on at {}", config.signon_url());

        let app = create_router(self.state);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &IdpConfig {
        self.state.config()
    }

    /// Creates a test router without starting the server.
    pub fn test_router(&self) -> Router {
        create_router(self.state.clone())
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

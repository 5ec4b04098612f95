//! Runtime services and shared state for review-relay.

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tracing::{info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, Void},
    },
    interaction::github_hook,
    service::{chat::ChatClient, db::DbClient},
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the database client, chat client, and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The database client instance.
    pub db: DbClient,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Initialize the database.
        let db = DbClient::surreal(&config).await?;

        // Initialize the slack client.
        let chat = ChatClient::slack()?;

        Ok(Self { config, db, chat })
    }

    /// The HTTP surface: the webhook route plus a liveness probe.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/github", post(github_hook::github_hook))
            .route("/healthz", get(healthz))
            .with_state(self.clone())
    }

    /// Bind the listener and serve until shutdown.
    pub async fn start(&self) -> Void {
        let address: SocketAddr = self.config.bind_address.parse()?;

        let listener = tokio::net::TcpListener::bind(address).await?;

        info!("Listening on {}", address);

        axum::serve(listener, self.router()).with_graceful_shutdown(shutdown_signal()).await?;

        Ok(())
    }
}

/// Liveness probe.
async fn healthz() -> &'static str {
    "ok"
}

/// Resolves when the process receives ctrl-c.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

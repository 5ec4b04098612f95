//! Library root for `review-relay`.
//!
//! Review-relay forwards GitHub pull request activity into Slack direct
//! messages:
//! - Review requests reach both the author and the requested reviewer
//! - Submitted reviews and approvals reach the pull request author
//! - GitHub logins map to Slack users through per-workspace identity links
//!
//! The relay integrates with Slack for chat and SurrealDB for storage.
//! The architecture is built around extensible traits that allow for
//! different implementations of each service.

#[deny(missing_docs)]
pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the review-relay runtime:
/// - Initializes the crypto provider
/// - Creates the runtime context with database and chat clients
/// - Binds the webhook listener and serves until shutdown
pub async fn start(config: Config) -> Void {
    info!("Starting review-relay ...");

    // Start the crypto provider.
    crypto::ring::default_provider().install_default().unwrap();

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}

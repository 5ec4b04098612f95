use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::base::types::{Res, Void};

pub mod surreal;

// Traits.

/// Generic database client trait that clients must implement.
///
/// This trait defines the read surface the relay needs (workspace
/// credentials and identity links) plus the write surface used to
/// provision them. Implementing this trait allows different database
/// backends to be used with review-relay.
#[async_trait]
pub trait GenericDbClient: Send + Sync + 'static {
    /// Load a workspace record, including its bot credential.
    ///
    /// An unknown workspace is an error: a delivery addressed to a
    /// workspace this store has never seen cannot be processed.
    async fn load_workspace(&self, workspace: &str) -> Res<Workspace>;

    /// Load the identity links for a GitHub login within a workspace.
    ///
    /// Returns every matching link in store order. An unlinked login
    /// yields an empty list, not an error.
    async fn load_links(&self, workspace: &str, github_name: &str) -> Res<Vec<Link>>;

    /// Create or replace a workspace record.
    async fn save_workspace(&self, workspace: &Workspace) -> Void;

    /// Add an identity link to a workspace.
    async fn save_link(&self, workspace: &str, link: &Link) -> Void;
}

// Data types.

/// A Slack workspace this app is installed into, with the bot credential
/// used to deliver messages there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Workspace identifier, as carried in the webhook address.
    pub id: String,
    /// Bot token used for deliveries into this workspace.
    pub bot_token: String,
}

/// One GitHub-login-to-Slack-user association, scoped to a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The GitHub login.
    pub github: String,
    /// The Slack user id it maps to.
    pub slack: String,
}

// Structs.

/// Database client for review-relay.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DbClient {
    /// The database client instance.
    pub inner: Arc<dyn GenericDbClient>,
}

impl Deref for DbClient {
    type Target = dyn GenericDbClient;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl DbClient {
    pub fn new(inner: Arc<dyn GenericDbClient>) -> Self {
        Self { inner }
    }
}

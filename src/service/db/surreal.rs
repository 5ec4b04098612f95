//! SurrealDB-backed workspace and link store.
//!
//! Workspaces live in the `workspace` table keyed by their id; links live
//! in the `link` table as plain rows. The relay only reads these at
//! request time; the write methods exist for provisioning and tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{
    RecordId, Surreal,
    engine::any::{Any, connect},
    opt::auth::Root,
};
use tracing::{info, instrument};

use crate::base::{
    config::Config,
    types::{Res, Void},
};

use super::{DbClient, GenericDbClient, Link, Workspace};

const WORKSPACE_TABLE: &str = "workspace";
const LINK_TABLE: &str = "link";

// Extra methods on `DbClient` applied by the surreal implementation.

impl DbClient {
    /// Creates a new SurrealDB-backed client from configuration.
    pub async fn surreal(config: &Config) -> Res<Self> {
        let endpoint = if config.db_endpoint == "memory" { "mem://" } else { config.db_endpoint.as_str() };

        let client = SurrealDbClient::new(endpoint, &config.db_username, &config.db_password, &config.db_namespace, &config.db_database).await?;

        Ok(Self { inner: Arc::new(client) })
    }

    /// Creates an in-memory SurrealDB client, for tests and local runs.
    pub async fn surreal_memory() -> Res<Self> {
        let client = SurrealDbClient::new("mem://", "", "", "relay", "relay").await?;

        Ok(Self { inner: Arc::new(client) })
    }
}

// Record types.

/// Stored workspace row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SurrealWorkspace {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,
    bot_token: String,
    created_at: DateTime<Utc>,
}

/// Stored link row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SurrealLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,
    workspace: String,
    github: String,
    slack: String,
    created_at: DateTime<Utc>,
}

// Structs.

/// SurrealDB client implementation.
#[derive(Clone)]
pub struct SurrealDbClient {
    db: Surreal<Any>,
}

impl SurrealDbClient {
    /// Connect, authenticate if credentials were given, and select the
    /// namespace and database.
    #[instrument(name = "SurrealDbClient::new", skip(username, password))]
    pub async fn new(endpoint: &str, username: &str, password: &str, namespace: &str, database: &str) -> Res<Self> {
        let db = connect(endpoint).await?;

        // The embedded engines have no root user.
        if !username.is_empty() {
            db.signin(Root { username, password }).await?;
        }

        db.use_ns(namespace).use_db(database).await?;

        info!("Connected to SurrealDB at {}", endpoint);

        Ok(Self { db })
    }
}

#[async_trait]
impl GenericDbClient for SurrealDbClient {
    #[instrument(skip(self))]
    async fn load_workspace(&self, workspace: &str) -> Res<Workspace> {
        let record: Option<SurrealWorkspace> = self.db.select((WORKSPACE_TABLE, workspace)).await?;

        let record = record.ok_or_else(|| anyhow::anyhow!("Unknown workspace: {}", workspace))?;

        Ok(Workspace {
            id: workspace.to_string(),
            bot_token: record.bot_token,
        })
    }

    #[instrument(skip(self))]
    async fn load_links(&self, workspace: &str, github_name: &str) -> Res<Vec<Link>> {
        // No ORDER BY: callers take the rows in whatever order the store
        // returns them.
        let mut response = self
            .db
            .query("SELECT * FROM link WHERE workspace = $workspace AND github = $github")
            .bind(("workspace", workspace.to_string()))
            .bind(("github", github_name.to_string()))
            .await?;

        let records: Vec<SurrealLink> = response.take(0)?;

        Ok(records.into_iter().map(|record| Link { github: record.github, slack: record.slack }).collect())
    }

    #[instrument(skip(self, workspace))]
    async fn save_workspace(&self, workspace: &Workspace) -> Void {
        let record = SurrealWorkspace {
            id: None,
            bot_token: workspace.bot_token.clone(),
            created_at: Utc::now(),
        };

        let _: Option<SurrealWorkspace> = self.db.upsert((WORKSPACE_TABLE, workspace.id.as_str())).content(record).await?;

        Ok(())
    }

    #[instrument(skip(self, link))]
    async fn save_link(&self, workspace: &str, link: &Link) -> Void {
        let record = SurrealLink {
            id: None,
            workspace: workspace.to_string(),
            github: link.github.clone(),
            slack: link.slack.clone(),
            created_at: Utc::now(),
        };

        let _: Option<SurrealLink> = self.db.create(LINK_TABLE).content(record).await?;

        Ok(())
    }
}

// Tests.

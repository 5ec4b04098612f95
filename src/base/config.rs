//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default bind address for the webhook listener.
fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

/// Default database namespace to use.
fn default_db_namespace() -> String {
    "relay".to_string()
}

/// Default database name to use.
fn default_db_database() -> String {
    "relay".to_string()
}

/// Configuration for the review-relay application.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// The shared inner configuration.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// The actual configuration values.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Socket address the webhook listener binds to (`BIND_ADDRESS`).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Database endpoint URL (`DB_ENDPOINT`).
    /// The value `memory` selects the embedded in-memory engine.
    pub db_endpoint: String,
    /// Database username (`DB_USERNAME`). Ignored by the in-memory engine.
    #[serde(default)]
    pub db_username: String,
    /// Database password (`DB_PASSWORD`). Ignored by the in-memory engine.
    #[serde(default)]
    pub db_password: String,
    /// Database namespace (`DB_NAMESPACE`).
    #[serde(default = "default_db_namespace")]
    pub db_namespace: String,
    /// Database name (`DB_DATABASE`).
    #[serde(default = "default_db_database")]
    pub db_database: String,
}

impl Config {
    /// Load configuration from the environment and an optional TOML file.
    pub fn load(explicit_path: Option<&std::path::Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default().prefix("REVIEW_RELAY"));

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if std::path::Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        if result.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(anyhow::anyhow!("Bind address must be a valid socket address."));
        }

        if result.db_endpoint.is_empty() {
            return Err(anyhow::anyhow!("A database endpoint must be provided."));
        }

        Ok(result)
    }
}

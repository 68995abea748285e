//! SurrealDB Handle - connection setup
//!
//! Supports in-memory (`mem://`), local file (`surrealkv://<path>`), any
//! other engine URL, and SurrealDB Cloud over WebSocket. Every constructor
//! selects the namespace/database and runs [`migrations::init_schema`].

use crate::error::StateError;
use crate::migrations;
use crate::Result;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Surreal;
use tracing::{info, instrument};

/// Namespace used unless configured otherwise.
pub const DEFAULT_NAMESPACE: &str = "diligent";

/// Database used unless configured otherwise.
pub const DEFAULT_DATABASE: &str = "main";

/// Local store used when no remote is configured.
pub const DEFAULT_LOCAL_PATH: &str = ".diligent/db";

/// Configuration for SurrealDB Cloud connection
#[derive(Debug, Clone)]
pub struct CloudConfig {
    /// WebSocket endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud")
    pub endpoint: String,
    /// Database username
    pub username: String,
    /// Database password
    pub password: String,
    /// Namespace (default: "diligent")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

impl CloudConfig {
    /// Create from environment variables
    ///
    /// Reads:
    /// - SURREALDB_ENDPOINT (required)
    /// - SURREALDB_USERNAME (required)
    /// - SURREALDB_PASSWORD (required)
    /// - SURREALDB_NAMESPACE (optional, default: "diligent")
    /// - SURREALDB_DATABASE (optional, default: "main")
    /// - SURREALDB_ROOT (optional, default: "false") - set to "true" for root users
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<Self, String> {
        let endpoint = lookup("SURREALDB_ENDPOINT").ok_or("SURREALDB_ENDPOINT not set")?;
        let username = lookup("SURREALDB_USERNAME").ok_or("SURREALDB_USERNAME not set")?;
        let password = lookup("SURREALDB_PASSWORD").ok_or("SURREALDB_PASSWORD not set")?;
        let namespace =
            lookup("SURREALDB_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let database =
            lookup("SURREALDB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        let is_root = lookup("SURREALDB_ROOT")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            username,
            password,
            namespace,
            database,
            is_root,
        })
    }
}

/// SurrealDB connection handle with the diligent schema in place.
#[derive(Clone)]
pub struct SurrealHandle {
    db: Surreal<Any>,
}

impl SurrealHandle {
    /// Connect to SurrealDB in-memory and set up schema.
    #[instrument(skip_all)]
    pub async fn setup_db() -> Result<Self> {
        Self::connect("mem://").await
    }

    /// Connect to any engine URL (`mem://`, `surrealkv://path`, `ws://host`, ...).
    #[instrument(skip_all, fields(url = %url))]
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to SurrealDB");

        let db = surrealdb::engine::any::connect(url)
            .await
            .map_err(|e| StateError::Connection(format!("Failed to connect to {}: {}", url, e)))?;

        Self::select(db, DEFAULT_NAMESPACE, DEFAULT_DATABASE).await
    }

    async fn select(db: Surreal<Any>, namespace: &str, database: &str) -> Result<Self> {
        db.use_ns(namespace).use_db(database).await.map_err(|e| {
            StateError::Connection(format!("Failed to select {namespace}/{database}: {e}"))
        })?;
        migrations::init_schema(&db).await?;
        Ok(Self { db })
    }

    /// Connect to SurrealDB Cloud.
    ///
    /// Root users sign in at the server level; everyone else signs in to the
    /// configured namespace/database.
    #[instrument(skip(config), fields(endpoint = %config.endpoint, namespace = %config.namespace, database = %config.database))]
    pub async fn setup_cloud(config: CloudConfig) -> Result<Self> {
        info!("Connecting to SurrealDB Cloud (root={})", config.is_root);

        let db = surrealdb::engine::any::connect(&config.endpoint)
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
            })?;

        if config.is_root {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StateError::Connection(format!("Root authentication failed: {}", e)))?;
        } else {
            db.signin(Database {
                namespace: &config.namespace,
                database: &config.database,
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| {
                StateError::Connection(format!("Database authentication failed: {}", e))
            })?;
        }

        let handle = Self::select(db, &config.namespace, &config.database).await?;
        info!("SurrealDB Cloud connected and schema initialized");
        Ok(handle)
    }

    /// Connect using environment variables.
    ///
    /// If SURREALDB_ENDPOINT is set, connects to cloud.
    /// If SURREALDB_URL is set, connects to that URL.
    /// Otherwise, persists locally under `.diligent/db`.
    #[instrument(skip_all)]
    pub async fn setup_from_env() -> Result<Self> {
        if let Ok(config) = CloudConfig::from_env() {
            info!("Cloud config found, connecting to SurrealDB Cloud");
            return Self::setup_cloud(config).await;
        }

        if let Ok(url) = std::env::var("SURREALDB_URL") {
            info!("SURREALDB_URL found, connecting to {}", url);
            return Self::connect(&url).await;
        }

        Self::setup_local(DEFAULT_LOCAL_PATH).await
    }

    /// Persist to a SurrealKV directory, creating it if needed.
    pub async fn setup_local(path: &str) -> Result<Self> {
        std::fs::create_dir_all(path).map_err(|e| {
            StateError::Connection(format!(
                "Failed to create database directory {}: {}",
                path, e
            ))
        })?;
        let url = format!("surrealkv://{}", path);
        info!("Using local persistence: {}", url);
        Self::connect(&url).await
    }

    /// Underlying client.
    pub fn db(&self) -> &Surreal<Any> {
        &self.db
    }
}

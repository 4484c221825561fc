//! # Database Module
//!
//! This module is the persistent store adapter for the parking services.
//! Every entity type lives in its own collection of JSON documents:
//!
//! - `reservations` - bookings of one spot by one user over one interval
//! - `spots` - parking spots with their hourly price
//! - `users` - accounts and their roles
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        STORE LAYER                               │
//! │                                                                  │
//! │  ┌──────────────────────────────────────────────────────────┐   │
//! │  │      Collection<T>  (typed, per-call deadline)            │   │
//! │  └──────────────────────────────────────────────────────────┘   │
//! │                              │                                   │
//! │                  Arc<dyn DocumentStore>                          │
//! │         ┌────────────────────┴────────────────────┐             │
//! │         ▼                                         ▼             │
//! │  ┌──────────────┐                         ┌──────────────┐      │
//! │  │PostgresStore │                         │ MemoryStore  │      │
//! │  │ JSONB tables │                         │ local only   │      │
//! │  └──────────────┘                         └──────────────┘      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

use std::time::Duration;

use deadpool_postgres::{Config, Pool, Runtime};
use thiserror::Error;
use tokio_postgres::{Config as TokioConfig, NoTls};
use tracing::{debug, info};

/// Schema applied at startup. Every statement is idempotent.
const INITIAL_SCHEMA: &str = include_str!("../../migrations/001_initial_schema.sql");

/// Store-related errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to connect to the database
    #[error("Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryError(#[from] tokio_postgres::Error),

    /// Migration failed
    #[error("Migration failed: {0}")]
    MigrationError(String),

    /// No document is stored under the given key
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A document with the same key (or unique field) already exists
    #[error("Duplicate record: {0}")]
    DuplicateKey(String),

    /// A document could not be converted to or from JSON
    #[error("Document encoding failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The operation did not finish before its deadline
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// PostgreSQL connection wrapper.
///
/// This struct wraps the connection pool and owns schema setup.
///
/// ## Usage
///
/// ```rust,ignore
/// let db = Database::connect("postgres://...").await?;
/// db.run_migrations().await?;
/// let store = PostgresStore::new(db);
/// ```
#[derive(Clone)]
pub struct Database {
    /// The connection pool
    pool: Pool,
}

impl Database {
    /// Connect to the PostgreSQL database.
    ///
    /// Creates a connection pool with a maximum of 10 connections and
    /// verifies it with a trivial query.
    ///
    /// ## Arguments
    ///
    /// * `database_url` - PostgreSQL connection string
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        info!("Connecting to database...");

        // Parse the connection string using tokio_postgres::Config
        let tokio_config = database_url
            .parse::<TokioConfig>()
            .map_err(|e| StoreError::ConfigError(format!("Invalid database URL: {}", e)))?;

        // Convert to deadpool config
        let mut config = Config::new();

        if let Some(dbname) = tokio_config.get_dbname() {
            config.dbname = Some(dbname.to_string());
        }
        if let Some(user) = tokio_config.get_user() {
            config.user = Some(user.to_string());
        }
        if let Some(password) = tokio_config.get_password() {
            config.password = Some(String::from_utf8_lossy(password).to_string());
        }
        if let Some(tokio_postgres::config::Host::Tcp(host)) = tokio_config.get_hosts().first() {
            config.host = Some(host.clone());
        }
        if let Some(port) = tokio_config.get_ports().first() {
            config.port = Some(*port);
        }

        config.pool = Some(deadpool_postgres::PoolConfig {
            max_size: 10,
            ..Default::default()
        });

        let pool = config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        let client = pool
            .get()
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        client
            .query("SELECT 1", &[])
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// Create the collection tables and their indexes.
    ///
    /// The schema lives in `migrations/001_initial_schema.sql` and is
    /// compiled into the binary, so the working directory does not matter.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        info!("Running database migrations...");

        let client = self
            .pool
            .get()
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        debug!("Executing migration SQL ({} bytes)", INITIAL_SCHEMA.len());

        client
            .batch_execute(INITIAL_SCHEMA)
            .await
            .map_err(|e| StoreError::MigrationError(e.to_string()))?;

        info!("Migrations completed successfully");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

// Re-export commonly used items
pub use memory::MemoryStore;
pub use models::*;
pub use postgres::PostgresStore;
pub use store::{Collection, DocumentStore, Filter};

//! # Reserve Park Backend Service
//!
//! This is the main entry point for the parking reservation backend.
//! It provides:
//!
//! - Reservation, spot and user services over a shared document store
//! - The availability check every booking goes through
//! - A public facade under `/api` with token authentication and role checks
//! - The unauthenticated service routes on a separate internal listener
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        BACKEND SERVICE                           │
//! │                                                                  │
//! │  ┌───────────────────────────┐  ┌────────────────────────────┐  │
//! │  │  Public listener  /api    │  │  Internal listener         │  │
//! │  │  (Actix, bearer token)    │  │  /reservations /spots      │  │
//! │  │  role checks, price quote │  │  /users  (no auth)         │  │
//! │  └───────────────────────────┘  └────────────────────────────┘  │
//! │                │                             │                   │
//! │                └──────────────┬──────────────┘                   │
//! │                               │                                  │
//! │  ┌────────────────────────────┴──────────────────────────────┐  │
//! │  │                    SERVICE LAYER                           │  │
//! │  │  ┌──────────────────┐ ┌──────────────┐ ┌──────────────┐   │  │
//! │  │  │ReservationEngine │ │SpotRegistry  │ │UserDirectory │   │  │
//! │  │  └──────────────────┘ └──────────────┘ └──────────────┘   │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │                               │                                  │
//! │                  ┌────────────┴────────────┐                     │
//! │                  │  Arc<dyn DocumentStore> │                     │
//! │                  │  PostgreSQL | memory    │                     │
//! │                  └─────────────────────────┘                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! 1. Set up PostgreSQL and create the database (or use `STORE_BACKEND=memory`)
//! 2. Copy `.env.example` to `.env` and configure
//! 3. Start the server: `cargo run`; the schema is created on startup
//!
//! ## Environment Variables
//!
//! See `.env.example` for all required configuration.

use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod api;
mod auth;
mod config;
mod db;
mod models;
mod services;
mod utils;

use auth::TokenIssuer;
use config::{AppConfig, StoreBackend};
use db::{Collection, Database, DocumentStore, MemoryStore, PostgresStore};
use services::{ReservationEngine, SpotRegistry, UserDirectory};

/// Application state shared across all handlers.
///
/// Every service holds a typed collection over the same store handle.
pub struct AppState {
    /// Shared document store, used directly only by the health check
    pub store: Arc<dyn DocumentStore>,

    /// Reservation lifecycle and availability
    pub reservations: ReservationEngine,

    /// Spot CRUD and pricing
    pub spots: SpotRegistry,

    /// Accounts, login and token checks
    pub users: UserDirectory,

    /// Application configuration
    #[allow(dead_code)]
    pub config: AppConfig,
}

impl AppState {
    /// Wire every service onto `store`.
    ///
    /// ## Arguments
    ///
    /// * `store` - Backend shared by all collections
    /// * `config` - Supplies the store timeout, canceled-blocking policy and token settings
    pub fn new(store: Arc<dyn DocumentStore>, config: AppConfig) -> Self {
        let timeout = config.store_timeout;

        let reservations = ReservationEngine::new(
            Collection::new(store.clone(), timeout),
            config.availability_ignore_canceled,
        );
        let spots = SpotRegistry::new(Collection::new(store.clone(), timeout));
        let users = UserDirectory::new(
            Collection::new(store.clone(), timeout),
            TokenIssuer::new(config.jwt_secret.clone(), config.token_ttl),
        );

        Self {
            store,
            reservations,
            spots,
            users,
            config,
        }
    }
}

/// Select and prepare the configured store backend.
async fn open_store(config: &AppConfig) -> io::Result<Arc<dyn DocumentStore>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                io::Error::other("DATABASE_URL is required for the postgres store")
            })?;

            let db = Database::connect(url).await.map_err(io::Error::other)?;
            info!("🗄️  Database connected");

            // Run migrations to ensure schema is up to date
            db.run_migrations().await.map_err(io::Error::other)?;
            info!("📦 Database migrations complete");

            Ok(Arc::new(PostgresStore::new(db)))
        }
        StoreBackend::Memory => {
            warn!("Using the in-memory store; all data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Main entry point for the backend service.
///
/// This function:
/// 1. Loads configuration from environment
/// 2. Initializes logging
/// 3. Opens the document store
/// 4. Wires the services
/// 5. Launches the public and internal HTTP servers
#[actix_web::main]
async fn main() -> io::Result<()> {
    // =========================================
    // STEP 1: Load Environment
    // =========================================
    // Loaded first so RUST_LOG from .env reaches the subscriber
    dotenvy::dotenv().ok(); // It's okay if .env doesn't exist

    // =========================================
    // STEP 2: Initialize Logging
    // =========================================
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).map_err(io::Error::other)?;

    info!("🚀 Starting Reserve Park Backend Service");

    // =========================================
    // STEP 3: Load Configuration
    // =========================================
    let config = AppConfig::from_env().map_err(io::Error::other)?;

    info!("📋 Configuration loaded");
    info!("   Store backend: {:?}", config.store_backend);
    info!("   Store timeout: {:?}", config.store_timeout);
    if config.availability_ignore_canceled {
        info!("   Availability: canceled reservations do not block");
    } else {
        info!("   Availability: canceled reservations still block their window");
    }

    // =========================================
    // STEP 4: Open Store
    // =========================================
    let store = open_store(&config).await?;

    // =========================================
    // STEP 5: Create Application State
    // =========================================
    let app_state = Arc::new(AppState::new(store, config.clone()));
    info!("🔧 Services initialized");

    // =========================================
    // STEP 6: Start HTTP Servers
    // =========================================
    // Public: only the authenticated /api facade
    let public_state = app_state.clone();
    info!(
        "🌐 Starting public HTTP server on {}:{}",
        config.server_host, config.server_port
    );
    let public = HttpServer::new(move || {
        App::new()
            // Attach shared application state
            .app_data(web::Data::new(public_state.clone()))

            // Browser clients call the facade from other origins
            .wrap(Cors::permissive())

            // Add logging middleware
            .wrap(middleware::Logger::default())

            // Configure API routes
            .configure(api::configure_public_routes)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run();

    // Internal: the unauthenticated service routes
    info!(
        "🔒 Starting internal HTTP server on {}:{}",
        config.internal_host, config.internal_port
    );
    let internal = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(api::configure_internal_routes)
    })
    .bind((config.internal_host.as_str(), config.internal_port))?
    .run();

    futures::try_join!(public, internal)?;
    Ok(())
}

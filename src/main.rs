//! Card Bank Service
//!
//! REST backend for bank-card management.
//! Reads configuration from a TOML file (~/.config/cardbank/config.toml,
//! or the path in CARDBANK_CONFIG).

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use cardbank::application::{CardAccountService, IdentityService, UserDirectoryService};
use cardbank::config::{AppConfig, LoggingConfig};
use cardbank::domain::{CardRepository, UserRepository};
use cardbank::infrastructure::crypto::CardNumberCodec;
use cardbank::infrastructure::database::connect_with_retry;
use cardbank::infrastructure::database::migrator::Migrator;
use cardbank::infrastructure::{
    InMemoryCardRepository, InMemoryUserRepository, SeaOrmCardRepository, SeaOrmUserRepository,
};
use cardbank::shared::shutdown::ShutdownCoordinator;
use cardbank::{create_api_router, default_config_path, ApiContext};

const DEFAULT_JWT_SECRET: &str = "super-secret-key-change-in-production";

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    if logging.format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("CARDBANK_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let (app_cfg, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => {
            let mut cfg = AppConfig::default();
            cfg.apply_env_overrides();
            (cfg, Some(e))
        }
    };

    init_tracing(&app_cfg.logging);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => warn!("Failed to load config: {}. Using defaults.", e),
    }

    info!("Starting Card Bank Service...");

    // ── Prometheus metrics recorder (must be installed before any metrics calls) ──
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()?;
    info!("📊 Prometheus metrics recorder installed");

    // ── Secrets ────────────────────────────────────────────────
    let jwt_config = app_cfg.jwt_config();
    if jwt_config.secret == DEFAULT_JWT_SECRET {
        warn!("⚠️  Using the built-in JWT secret; set JWT_SECRET in production");
    }
    info!(
        "JWT configured with {}h token expiration",
        jwt_config.expiration_hours
    );

    let codec = match CardNumberCodec::new(&app_cfg.encryption) {
        Ok(codec) => codec,
        Err(e) => {
            error!("Card number encryption unavailable: {}", e);
            return Err(e.into());
        }
    };
    info!("🔐 Card number encryption key derived");

    // ── Repositories ───────────────────────────────────────────
    let (users, cards, db): (
        Arc<dyn UserRepository>,
        Arc<dyn CardRepository>,
        Option<DatabaseConnection>,
    ) = if app_cfg.database.is_in_memory() {
            warn!("Using in-memory repositories; data is lost on exit");
            let users = Arc::new(InMemoryUserRepository::new());
            let cards = Arc::new(InMemoryCardRepository::new(users.clone()));
            (
                users as Arc<dyn UserRepository>,
                cards as Arc<dyn CardRepository>,
                None,
            )
        } else {
            let db = match connect_with_retry(&app_cfg.database).await {
                Ok(db) => db,
                Err(e) => {
                    error!("Failed to connect to database: {}", e);
                    return Err(e.into());
                }
            };

            info!("Running database migrations...");
            if let Err(e) = Migrator::up(&db, None).await {
                error!("Failed to run migrations: {}", e);
                return Err(e.into());
            }
            info!("Migrations completed");

            (
                Arc::new(SeaOrmUserRepository::new(db.clone())) as Arc<dyn UserRepository>,
                Arc::new(SeaOrmCardRepository::new(db.clone())) as Arc<dyn CardRepository>,
                Some(db),
            )
        };

    // ── Services ───────────────────────────────────────────────
    let identity = Arc::new(IdentityService::new(
        users.clone(),
        jwt_config.clone(),
        app_cfg.security.bcrypt_cost,
    ));
    let directory = Arc::new(UserDirectoryService::new(users.clone()));
    let card_service = Arc::new(CardAccountService::new(cards, users, codec));

    // Create default admin user if no users exist
    match identity
        .ensure_default_admin(&app_cfg.admin.email, &app_cfg.admin.password)
        .await
    {
        Ok(Some(admin)) => {
            info!("Default admin created: {}", admin.email);
            info!("⚠️  Please change the admin password immediately!");
        }
        Ok(None) => {}
        Err(e) => error!("Failed to create admin user: {}", e),
    }

    // Initialize shutdown coordinator
    let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
    let shutdown_signal = shutdown.signal();

    // Start listening for shutdown signals (SIGTERM, SIGINT)
    shutdown.start_signal_listener();

    // Create REST API router
    let api_router = create_api_router(ApiContext {
        identity,
        cards: card_service,
        users: directory,
        jwt_config,
        pagination: app_cfg.pagination,
        db: db.clone(),
        prometheus: prometheus_handle,
    });

    // Start REST API server with graceful shutdown
    let api_addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown_signal.clone();
    let served = axum::serve(
        listener,
        api_router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        api_shutdown.wait().await;
        info!("🛑 REST API server received shutdown signal");
    })
    .await;

    if let Err(e) = served {
        error!("REST API server error: {}", e);
    }

    // Perform final cleanup
    info!("🧹 Performing final cleanup...");
    shutdown
        .cleanup_with_timeout(async move {
            if let Some(db) = db {
                match db.close().await {
                    Ok(()) => info!("✅ Database connection closed"),
                    Err(e) => warn!("Error closing database connection: {}", e),
                }
            }
        })
        .await;

    info!("👋 Card Bank Service shutdown complete");
    Ok(())
}

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use tracing::info;

use pricing_service::CatalogRepository;
use vitals_engine::VitalsRepository;

use crate::cache::CacheLayer;
use crate::services::AuditService;

/// Main server state, cloned into every handler
#[derive(Clone)]
pub struct HomeCareServer {
    /// Server configuration
    pub config: ServerConfig,
    /// Postgres connection pool
    pub db_pool: PgPool,
    /// Read-through cache (Redis with in-process fallback)
    pub cache: CacheLayer,
    /// Service catalog repository
    pub catalog: CatalogRepository,
    /// Vitals recording and alerting repository
    pub vitals: VitalsRepository,
    /// Audit trail writer
    pub audit: AuditService,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server name
    pub name: String,
    /// Maximum database connections
    pub max_db_connections: u32,
    /// Request timeout in seconds
    pub request_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "HomeCare Platform".to_string(),
            max_db_connections: 20,
            request_timeout: 30,
        }
    }
}

impl HomeCareServer {
    /// Create a new server instance from the environment
    ///
    /// Requires `DATABASE_URL`; `REDIS_URL` is optional and the cache
    /// degrades to in-process when it is absent or unreachable.
    pub async fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;
        let redis_url = env::var("REDIS_URL").ok();

        let config = ServerConfig::default();

        let db_pool = PgPoolOptions::new()
            .max_connections(config.max_db_connections)
            .connect(&database_url)
            .await
            .context("failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("failed to run database migrations")?;
        info!("database migrations applied");

        let cache = CacheLayer::connect(redis_url.as_deref()).await;

        Ok(Self::with_pool(config, db_pool, cache))
    }

    /// Assemble server state from existing components (used by tests)
    pub fn with_pool(config: ServerConfig, db_pool: PgPool, cache: CacheLayer) -> Self {
        let catalog = CatalogRepository::new(db_pool.clone());
        let vitals = VitalsRepository::new(db_pool.clone());
        let audit = AuditService::new(db_pool.clone());

        Self {
            config,
            db_pool,
            cache,
            catalog,
            vitals,
            audit,
        }
    }
}

//! Shared application state

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::auth::{JwtConfig, JwtService};
use crate::config::Config;
use crate::db::{MemoryStore, PgStore, Store, seed};

/// Handed to every handler and middleware.
///
/// The store is created once here and injected; nothing else holds a
/// process-wide connection.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub jwt: JwtService,
    pub config: Arc<Config>,
    /// Kept to close the pool on shutdown
    pg: Option<PgStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("environment", &self.config.environment)
            .field("postgres", &self.pg.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Connect (or fall back to the in-memory store), migrate and provision
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let now_ms = shared::util::now_millis();
        let (store, pg): (Arc<dyn Store>, Option<PgStore>) = match &config.database_url {
            Some(url) => {
                let pg = PgStore::connect(url).await?;
                pg.migrate().await?;
                tracing::info!("PostgreSQL store ready");
                (Arc::new(pg.clone()), Some(pg))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store");
                (Arc::new(MemoryStore::new()), None)
            }
        };

        seed::bootstrap(store.as_ref(), config.seed_demo_data, now_ms).await?;

        Ok(Self {
            store,
            jwt: JwtService::with_config(JwtConfig::from(config)),
            config: Arc::new(config.clone()),
            pg,
        })
    }

    /// State over an already provisioned store
    pub fn with_store(config: Config, store: Arc<dyn Store>) -> Self {
        Self {
            store,
            jwt: JwtService::with_config(JwtConfig::from(&config)),
            config: Arc::new(config),
            pg: None,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub async fn shutdown(&self) {
        if let Some(pg) = &self.pg {
            pg.close().await;
            tracing::info!("Database pool closed");
        }
    }
}

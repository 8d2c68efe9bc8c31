use crate::config::{AppConfig, JwtConfig, StoreBackend};
use crate::store::{seed, MemoryStore, PgStore, Store};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn Store> = match config.backend {
            StoreBackend::Memory => {
                info!("using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the postgres backend")?;
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                info!("connected to postgres; migrations applied");
                Arc::new(PgStore::new(db))
            }
        };

        if config.seed_products {
            seed::seed_if_empty(store.as_ref()).await?;
        }

        Ok(Self::from_parts(store, Arc::new(config)))
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// Memory-backed state with the demo catalog and a fixed test secret.
    pub fn fake() -> Self {
        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            backend: StoreBackend::Memory,
            database_url: None,
            db_max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            seed_products: true,
            static_dir: None,
        };
        let store = Arc::new(MemoryStore::with_products(seed::sample_products())) as Arc<dyn Store>;
        Self::from_parts(store, Arc::new(config))
    }
}

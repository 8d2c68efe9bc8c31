use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

const DEV_JWT_SECRET: &str = "storefront-dev-secret";
const DEFAULT_JWT_TTL_MINUTES: i64 = 60 * 24 * 7;
const MAX_JWT_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub seed_products: bool,
    pub static_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = var("DATABASE_URL").filter(|v| !v.is_empty());

        let backend = match var("STORE_BACKEND").as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("postgres") => StoreBackend::Postgres,
            Some(other) => anyhow::bail!("unknown STORE_BACKEND {other:?} (expected memory|postgres)"),
            None if database_url.is_some() => StoreBackend::Postgres,
            None => StoreBackend::Memory,
        };

        if backend == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required for the postgres backend");
        }

        let secret = match (var("JWT_SECRET"), backend) {
            (Some(s), _) if !s.is_empty() => s,
            (_, StoreBackend::Postgres) => anyhow::bail!("JWT_SECRET is required for the postgres backend"),
            (_, StoreBackend::Memory) => {
                tracing::warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let ttl_minutes = match var("JWT_TTL_MINUTES") {
            Some(v) => {
                let minutes = v
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("invalid JWT_TTL_MINUTES {v:?}"))?;
                if !(1..=MAX_JWT_TTL_MINUTES).contains(&minutes) {
                    anyhow::bail!("JWT_TTL_MINUTES must be between 1 and {MAX_JWT_TTL_MINUTES}, got {minutes}");
                }
                minutes
            }
            None => DEFAULT_JWT_TTL_MINUTES,
        };

        let jwt = JwtConfig {
            secret,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "storefront".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "storefront-users".into()),
            ttl_minutes,
        };

        let port = match var("APP_PORT") {
            Some(p) => p.parse::<u16>().with_context(|| format!("invalid APP_PORT {p:?}"))?,
            None => 5000,
        };

        Ok(Self {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            backend,
            database_url,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt,
            seed_products: var("SEED_PRODUCTS")
                .map(|v| !matches!(v.as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
            static_dir: var("STATIC_DIR").filter(|v| !v.is_empty()).map(PathBuf::from),
        })
    }
}

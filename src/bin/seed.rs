//! Resets the Postgres catalog to the demo products.

use anyhow::Context;
use storefront::products::repo_types::Product;
use storefront::store::{seed, PgStore, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "storefront=info".into()))
        .init();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .context("connect to database")?;
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    let removed = Product::delete_all(&db).await.context("clear products")?;
    tracing::info!(removed, "cleared existing products");

    let store = PgStore::new(db);
    let inserted = seed::seed_if_empty(&store).await?;
    tracing::info!(inserted, total = store.count_products().await?, "sample products inserted");
    Ok(())
}

use sqlx::{types::Json, PgConnection, PgPool};
use uuid::Uuid;

use crate::cart::repo_types::CartItem;

pub async fn get(db: &PgPool, user_id: Uuid) -> Result<Vec<CartItem>, sqlx::Error> {
    let row: Option<Json<Vec<CartItem>>> =
        sqlx::query_scalar("SELECT items FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    Ok(row.map(|Json(items)| items).unwrap_or_default())
}

pub async fn upsert(
    conn: &mut PgConnection,
    user_id: Uuid,
    items: &[CartItem],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO carts (user_id, items, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (user_id) DO UPDATE
           SET items = EXCLUDED.items, updated_at = now()
        "#,
    )
    .bind(user_id)
    .bind(Json(items))
    .execute(conn)
    .await?;
    Ok(())
}

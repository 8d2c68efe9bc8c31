use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::products::repo_types::{NewProduct, Product, ProductFilter, ProductPatch};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, category, image, stock, featured, created_at, updated_at";

impl Product {
    /// List products in insertion order.
    pub async fn list(db: &PgPool, filter: ProductFilter) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::product_category IS NULL OR category = $1)
              AND (NOT $2 OR featured)
            ORDER BY seq ASC
            "#
        ))
        .bind(filter.category)
        .bind(filter.featured_only)
        .fetch_all(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn count(db: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(db)
            .await
    }

    pub async fn insert(db: &PgPool, new: NewProduct) -> Result<Product, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (id, name, description, price, category, image, stock, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.name)
        .bind(new.description)
        .bind(new.price)
        .bind(new.category)
        .bind(new.image)
        .bind(new.stock)
        .bind(new.featured)
        .fetch_one(db)
        .await
    }

    /// Partial update; `COALESCE` keeps columns whose patch value is NULL.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        patch: ProductPatch,
    ) -> Result<Option<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET
                name        = COALESCE($2, name),
                description = COALESCE($3, description),
                price       = COALESCE($4, price),
                category    = COALESCE($5, category),
                image       = COALESCE($6, image),
                stock       = COALESCE($7, stock),
                featured    = COALESCE($8, featured),
                updated_at  = now()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.price)
        .bind(patch.category)
        .bind(patch.image)
        .bind(patch.stock)
        .bind(patch.featured)
        .fetch_optional(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let res = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn delete_all(db: &PgPool) -> Result<u64, sqlx::Error> {
        let res = sqlx::query("DELETE FROM products").execute(db).await?;
        Ok(res.rows_affected())
    }

    /// Row-lock the given products for the rest of the transaction.
    pub async fn lock_many_tx(
        conn: &mut PgConnection,
        ids: &[Uuid],
    ) -> Result<Vec<Product>, sqlx::Error> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#
        ))
        .bind(ids)
        .fetch_all(conn)
        .await
    }

    pub async fn decrement_stock_tx(
        conn: &mut PgConnection,
        id: Uuid,
        quantity: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE products
               SET stock = stock - $2, updated_at = now()
             WHERE id = $1 AND stock >= $2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .execute(conn)
        .await?;
        Ok(())
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::auth::repo_types::{NewUser, User};
use crate::cart::{repo as cart_repo, repo_types::CartItem};
use crate::orders::repo as order_repo;
use crate::orders::repo_types::{NewOrder, Order, StatusUpdate};
use crate::orders::services::{apply_status_update, price_lines};
use crate::products::repo_types::{NewProduct, Product, ProductFilter, ProductPatch};

const UNIQUE_VIOLATION: &str = "23505";

/// Maps a unique-constraint violation to `Conflict`, everything else to `Database`.
fn conflict_or(e: sqlx::Error, msg: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::Conflict(msg);
        }
    }
    StoreError::Database(e)
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError> {
        Ok(Product::list(&self.db, filter).await?)
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(Product::find_by_id(&self.db, id).await?)
    }

    async fn count_products(&self) -> Result<i64, StoreError> {
        Ok(Product::count(&self.db).await?)
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        Product::insert(&self.db, new)
            .await
            .map_err(|e| conflict_or(e, "Product name already exists"))
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, StoreError> {
        Product::update(&self.db, id, patch)
            .await
            .map_err(|e| conflict_or(e, "Product name already exists"))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Product::delete(&self.db, id).await?)
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        User::create(&self.db, new)
            .await
            .map_err(|e| conflict_or(e, "User already exists"))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.db, email).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.db, id).await?)
    }

    async fn get_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>, StoreError> {
        Ok(cart_repo::get(&self.db, user_id).await?)
    }

    async fn replace_cart(&self, user_id: Uuid, items: Vec<CartItem>) -> Result<Vec<CartItem>, StoreError> {
        let mut conn = self.db.acquire().await?;
        cart_repo::upsert(&mut conn, user_id, &items).await?;
        Ok(items)
    }

    async fn place_order(&self, user_id: Uuid, order: NewOrder) -> Result<Order, StoreError> {
        let mut tx = self.db.begin().await?;

        let ids: Vec<Uuid> = order.lines.iter().map(|l| l.product).collect();
        let catalog: HashMap<Uuid, Product> = Product::lock_many_tx(&mut tx, &ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        // dropping `tx` on error rolls back
        let priced = price_lines(&order.lines, &catalog)?;
        for (id, qty) in &priced.decrements {
            Product::decrement_stock_tx(&mut tx, *id, *qty).await?;
        }
        let placed = order_repo::insert_tx(&mut tx, user_id, order, priced).await?;
        cart_repo::upsert(&mut tx, user_id, &[]).await?;

        tx.commit().await?;
        Ok(placed)
    }

    async fn list_orders(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        Ok(order_repo::list_by_user(&self.db, user_id).await?)
    }

    async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(order_repo::get_for_user(&self.db, user_id, order_id).await?)
    }

    async fn update_order_status(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        update: StatusUpdate,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self.db.begin().await?;
        let Some(row) = order_repo::lock_for_user_tx(&mut tx, user_id, order_id).await? else {
            return Ok(None);
        };

        // transition rules only look at the header, items are not needed here
        let mut current = row.into_order(Vec::new());
        apply_status_update(&mut current, update, OffsetDateTime::now_utc())?;
        order_repo::set_status_tx(&mut tx, order_id, update).await?;
        tx.commit().await?;

        self.get_order(user_id, order_id).await
    }
}

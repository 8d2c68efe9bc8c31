//! Storage backends. Every handler talks to a `dyn Store`; `MemoryStore`
//! keeps state in process and `PgStore` persists it in Postgres.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::cart::repo_types::CartItem;
use crate::orders::repo_types::{NewOrder, Order, StatusUpdate};
use crate::orders::services::OrderError;
use crate::products::repo_types::{NewProduct, Product, ProductFilter, ProductPatch};

mod memory;
mod postgres;
pub mod seed;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field (user email, product name) is already taken.
    #[error("{0}")]
    Conflict(&'static str),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Products matching `filter`, in insertion order.
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError>;
    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, StoreError>;
    async fn count_products(&self) -> Result<i64, StoreError>;
    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError>;
    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, StoreError>;
    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn get_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>, StoreError>;
    async fn replace_cart(&self, user_id: Uuid, items: Vec<CartItem>) -> Result<Vec<CartItem>, StoreError>;

    /// Checks stock for every line, decrements it, persists the order and
    /// empties the user's cart as one unit. On error nothing is changed.
    async fn place_order(&self, user_id: Uuid, order: NewOrder) -> Result<Order, StoreError>;
    /// The user's orders, newest first.
    async fn list_orders(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError>;
    async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> Result<Option<Order>, StoreError>;
    async fn update_order_status(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        update: StatusUpdate,
    ) -> Result<Option<Order>, StoreError>;
}

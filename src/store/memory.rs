use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::auth::repo_types::{NewUser, User};
use crate::cart::repo_types::CartItem;
use crate::orders::repo_types::{NewOrder, Order, OrderStatus, PaymentStatus, StatusUpdate};
use crate::orders::services::{apply_status_update, price_lines};
use crate::products::repo_types::{NewProduct, Product, ProductFilter, ProductPatch};

#[derive(Default)]
struct Inner {
    products: Vec<Product>,
    users: Vec<User>,
    orders: Vec<Order>,
    carts: HashMap<Uuid, Vec<CartItem>>,
}

/// In-process store. One mutex guards all collections, so each call sees
/// and leaves a consistent state.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `products`; used for the demo catalog and tests.
    pub fn with_products(products: Vec<NewProduct>) -> Self {
        let now = OffsetDateTime::now_utc();
        let inner = Inner {
            products: products.into_iter().map(|p| p.into_product(now)).collect(),
            ..Inner::default()
        };
        Self { inner: Mutex::new(inner) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.products.iter().filter(|p| filter.matches(p)).cloned().collect())
    }

    async fn get_product(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.products.iter().find(|p| p.id == id).cloned())
    }

    async fn count_products(&self) -> Result<i64, StoreError> {
        Ok(self.lock()?.products.len() as i64)
    }

    async fn create_product(&self, new: NewProduct) -> Result<Product, StoreError> {
        let mut inner = self.lock()?;
        if inner.products.iter().any(|p| p.name == new.name) {
            return Err(StoreError::Conflict("Product name already exists"));
        }
        let product = new.into_product(OffsetDateTime::now_utc());
        inner.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Option<Product>, StoreError> {
        let mut inner = self.lock()?;
        let Some(idx) = inner.products.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = &patch.name {
            if inner.products.iter().any(|p| p.id != id && &p.name == name) {
                return Err(StoreError::Conflict("Product name already exists"));
            }
        }
        let product = &mut inner.products[idx];
        patch.apply(product, OffsetDateTime::now_utc());
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        let before = inner.products.len();
        inner.products.retain(|p| p.id != id);
        Ok(inner.products.len() != before)
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut inner = self.lock()?;
        if inner.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict("User already exists"));
        }
        let user = new.into_user(OffsetDateTime::now_utc());
        inner.carts.insert(user.id, Vec::new());
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_cart(&self, user_id: Uuid) -> Result<Vec<CartItem>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.carts.get(&user_id).cloned().unwrap_or_default())
    }

    async fn replace_cart(&self, user_id: Uuid, items: Vec<CartItem>) -> Result<Vec<CartItem>, StoreError> {
        let mut inner = self.lock()?;
        inner.carts.insert(user_id, items.clone());
        Ok(items)
    }

    async fn place_order(&self, user_id: Uuid, order: NewOrder) -> Result<Order, StoreError> {
        let mut inner = self.lock()?;

        let catalog: HashMap<Uuid, Product> = order
            .lines
            .iter()
            .filter_map(|l| inner.products.iter().find(|p| p.id == l.product))
            .map(|p| (p.id, p.clone()))
            .collect();
        let priced = price_lines(&order.lines, &catalog)?;

        let now = OffsetDateTime::now_utc();
        for (id, qty) in &priced.decrements {
            if let Some(p) = inner.products.iter_mut().find(|p| p.id == *id) {
                p.stock -= qty;
                p.updated_at = now;
            }
        }

        let placed = Order {
            id: Uuid::new_v4(),
            user_id,
            order_number: order.order_number,
            items: priced.items,
            total_amount: priced.total,
            shipping_address: order.shipping_address,
            payment_status: PaymentStatus::Completed,
            order_status: OrderStatus::Processing,
            created_at: now,
            updated_at: now,
        };
        inner.orders.push(placed.clone());
        inner.carts.insert(user_id, Vec::new());
        Ok(placed)
    }

    async fn list_orders(&self, user_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.orders.iter().rev().filter(|o| o.user_id == user_id).cloned().collect())
    }

    async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .orders
            .iter()
            .find(|o| o.id == order_id && o.user_id == user_id)
            .cloned())
    }

    async fn update_order_status(
        &self,
        user_id: Uuid,
        order_id: Uuid,
        update: StatusUpdate,
    ) -> Result<Option<Order>, StoreError> {
        let mut inner = self.lock()?;
        let Some(order) = inner
            .orders
            .iter_mut()
            .find(|o| o.id == order_id && o.user_id == user_id)
        else {
            return Ok(None);
        };
        apply_status_update(order, update, OffsetDateTime::now_utc())?;
        Ok(Some(order.clone()))
    }
}

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_IMAGE: &str = "https://images.unsplash.com/photo-1560343090-f0409e92791a?w=500";

/// Prices are stored as `NUMERIC(12, 2)`.
pub const PRICE_SCALE: u32 = 2;
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, PRICE_SCALE); // 9_999_999_999.99

/// Catalog category; stored as the `product_category` Postgres enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "product_category", rename_all = "lowercase")]
pub enum Category {
    Electronics,
    Clothing,
    Books,
    Home,
    Accessories,
    Sports,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Electronics,
        Category::Clothing,
        Category::Books,
        Category::Home,
        Category::Accessories,
        Category::Sports,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Clothing => "clothing",
            Category::Books => "books",
            Category::Home => "home",
            Category::Accessories => "accessories",
            Category::Sports => "sports",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Category is either: electronics, clothing, books, home, accessories, sports")]
pub struct UnknownCategory;

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(UnknownCategory)
    }
}

/// Product row in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: Category,
    pub image: String,
    pub stock: i32,
    pub featured: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated input for inserting a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: Category,
    pub image: String,
    pub stock: i32,
    pub featured: bool,
}

impl NewProduct {
    pub fn into_product(self, now: OffsetDateTime) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            image: self.image,
            stock: self.stock,
            featured: self.featured,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<Category>,
    pub image: Option<String>,
    pub stock: Option<i32>,
    pub featured: Option<bool>,
}

impl ProductPatch {
    pub fn apply(self, product: &mut Product, now: OffsetDateTime) {
        if let Some(v) = self.name {
            product.name = v;
        }
        if let Some(v) = self.description {
            product.description = v;
        }
        if let Some(v) = self.price {
            product.price = v;
        }
        if let Some(v) = self.category {
            product.category = v;
        }
        if let Some(v) = self.image {
            product.image = v;
        }
        if let Some(v) = self.stock {
            product.stock = v;
        }
        if let Some(v) = self.featured {
            product.featured = v;
        }
        product.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<Category>,
    pub featured_only: bool,
}

impl ProductFilter {
    pub fn matches(&self, p: &Product) -> bool {
        self.category.map_or(true, |c| p.category == c) && (!self.featured_only || p.featured)
    }
}

use anyhow::Context;
use rust_decimal::Decimal;
use tracing::info;

use super::Store;
use crate::products::repo_types::{Category, NewProduct};

/// The demo catalog.
pub fn sample_products() -> Vec<NewProduct> {
    fn p(
        name: &str,
        description: &str,
        cents: i64,
        category: Category,
        image: &str,
        stock: i32,
        featured: bool,
    ) -> NewProduct {
        NewProduct {
            name: name.into(),
            description: description.into(),
            price: Decimal::new(cents, 2),
            category,
            image: image.into(),
            stock,
            featured,
        }
    }

    vec![
        p(
            "Wireless Bluetooth Headphones",
            "High-quality wireless headphones with noise cancellation and 30-hour battery life. Perfect for music lovers and professionals.",
            9999,
            Category::Electronics,
            "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=500",
            50,
            true,
        ),
        p(
            "Smartphone Pro Max",
            "Latest smartphone with advanced camera system, 5G connectivity, and powerful processor.",
            69999,
            Category::Electronics,
            "https://images.unsplash.com/photo-1511707171634-5f897ff02aa9?w=500",
            30,
            true,
        ),
        p(
            "Casual T-Shirt",
            "Comfortable cotton t-shirt available in multiple colors. Perfect for everyday wear.",
            1999,
            Category::Clothing,
            "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?w=500",
            100,
            false,
        ),
        p(
            "Programming Book Bundle",
            "Complete guide to web development including HTML, CSS, JavaScript, and Node.js.",
            4999,
            Category::Books,
            "https://images.unsplash.com/photo-1544716278-ca5e3f4abd8c?w=500",
            25,
            true,
        ),
        p(
            "Coffee Maker",
            "Automatic coffee maker with programmable features and thermal carafe.",
            7999,
            Category::Home,
            "https://images.unsplash.com/photo-1495474472287-4d71bcdd2085?w=500",
            15,
            false,
        ),
        p(
            "Laptop Backpack",
            "Durable backpack with laptop compartment and multiple pockets for organization.",
            3999,
            Category::Accessories,
            "https://images.unsplash.com/photo-1553062407-98eeb64c6a62?w=500",
            40,
            true,
        ),
    ]
}

/// Inserts the demo catalog when the store has no products yet.
/// Returns how many products were inserted.
pub async fn seed_if_empty(store: &dyn Store) -> anyhow::Result<usize> {
    let existing = store.count_products().await.context("count products")?;
    if existing > 0 {
        info!(existing, "catalog already populated; skipping seed");
        return Ok(0);
    }

    let products = sample_products();
    let n = products.len();
    for p in products {
        let name = p.name.clone();
        store
            .create_product(p)
            .await
            .with_context(|| format!("seed product {name}"))?;
    }
    info!(count = n, "seeded sample products");
    Ok(n)
}

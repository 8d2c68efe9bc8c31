use std::collections::HashMap;

use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::dto::{CreateOrderRequest, ShippingAddressInput};
use super::repo_types::{
    LineRequest, NewOrder, Order, OrderItem, OrderStatus, ShippingAddress, StatusUpdate,
};
use crate::products::repo_types::Product;
use crate::store::{Store, StoreError};

pub const DEFAULT_COUNTRY: &str = "United States";
const ORDER_SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ORDER_SUFFIX_LEN: usize = 6;

/// Largest total `orders.total_amount NUMERIC(14, 2)` can hold.
pub const MAX_ORDER_TOTAL: Decimal = Decimal::from_parts(0x107A_3FFF, 0x5AF3, 0, false, 2); // 999_999_999_999.99

/// Why an order could not be placed or changed. The message is shown to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("No items in order")]
    Empty,
    #[error("Shipping address is required")]
    MissingShipping,
    #[error("Invalid quantity for {0}")]
    InvalidQuantity(Uuid),
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),
    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),
    #[error("Order total is too large")]
    TotalTooLarge,
    #[error("Order is already {0}")]
    Finalized(OrderStatus),
    #[error("No status change requested")]
    NoStatusChange,
}

/// Lines checked against the catalog, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    /// Combined quantity to take from each product, in first-seen order.
    pub decrements: Vec<(Uuid, i32)>,
}

/// Checks every line against `catalog` and prices it. The first failing
/// line decides the error. Repeated lines for one product are checked
/// against their combined quantity.
pub fn price_lines(
    lines: &[LineRequest],
    catalog: &HashMap<Uuid, Product>,
) -> Result<PricedOrder, OrderError> {
    if lines.is_empty() {
        return Err(OrderError::Empty);
    }

    let mut items = Vec::with_capacity(lines.len());
    let mut decrements: Vec<(Uuid, i32)> = Vec::new();
    let mut total = Decimal::ZERO;

    for line in lines {
        if line.quantity < 1 {
            return Err(OrderError::InvalidQuantity(line.product));
        }
        let product = catalog
            .get(&line.product)
            .ok_or(OrderError::ProductNotFound(line.product))?;

        let claimed = match decrements.iter_mut().find(|(id, _)| *id == product.id) {
            Some((_, qty)) => {
                *qty = qty
                    .checked_add(line.quantity)
                    .ok_or(OrderError::InvalidQuantity(line.product))?;
                *qty
            }
            None => {
                decrements.push((product.id, line.quantity));
                line.quantity
            }
        };
        if claimed > product.stock {
            return Err(OrderError::InsufficientStock(product.name.clone()));
        }

        let item = OrderItem {
            product: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: line.quantity,
            image: product.image.clone(),
        };
        total = item
            .subtotal()
            .and_then(|line_total| total.checked_add(line_total))
            .filter(|t| *t <= MAX_ORDER_TOTAL)
            .ok_or(OrderError::TotalTooLarge)?;
        items.push(item);
    }

    Ok(PricedOrder { items, total, decrements })
}

/// `ORD-<unix millis>-<6 uppercase alphanumerics>`
pub fn generate_order_number(now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_SUFFIX_LEN)
        .map(|_| ORDER_SUFFIX_CHARSET[rng.gen_range(0..ORDER_SUFFIX_CHARSET.len())] as char)
        .collect();
    format!("ORD-{millis}-{suffix}")
}

pub fn normalize_shipping(input: Option<ShippingAddressInput>) -> Result<ShippingAddress, OrderError> {
    fn required(v: Option<String>) -> Result<String, OrderError> {
        v.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(OrderError::MissingShipping)
    }

    let input = input.ok_or(OrderError::MissingShipping)?;
    Ok(ShippingAddress {
        name: required(input.name)?,
        address: required(input.address)?,
        city: required(input.city)?,
        postal_code: required(input.postal_code)?,
        country: input
            .country
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
    })
}

/// Applies a status update to `order` in place.
pub fn apply_status_update(
    order: &mut Order,
    update: StatusUpdate,
    now: OffsetDateTime,
) -> Result<(), OrderError> {
    if update.order_status.is_none() && update.payment_status.is_none() {
        return Err(OrderError::NoStatusChange);
    }
    if order.order_status.is_final() {
        return Err(OrderError::Finalized(order.order_status));
    }
    if let Some(s) = update.order_status {
        order.order_status = s;
    }
    if let Some(p) = update.payment_status {
        order.payment_status = p;
    }
    order.updated_at = now;
    Ok(())
}

pub async fn place_order(
    store: &dyn Store,
    user_id: Uuid,
    req: CreateOrderRequest,
) -> Result<Order, StoreError> {
    if req.items.is_empty() {
        return Err(OrderError::Empty.into());
    }
    let shipping_address = normalize_shipping(req.shipping_address)?;

    let draft = NewOrder {
        order_number: generate_order_number(OffsetDateTime::now_utc()),
        lines: req.items,
        shipping_address,
    };
    let order = store.place_order(user_id, draft).await?;

    info!(
        %user_id,
        order_id = %order.id,
        order_number = %order.order_number,
        total = %order.total_amount,
        "order created"
    );
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::repo_types::PaymentStatus;
    use crate::products::repo_types::{Category, NewProduct};

    fn product(name: &str, cents: i64, stock: i32) -> Product {
        NewProduct {
            name: name.into(),
            description: format!("{name} description"),
            price: Decimal::new(cents, 2),
            category: Category::Home,
            image: format!("https://img.local/{name}.jpg"),
            stock,
            featured: false,
        }
        .into_product(OffsetDateTime::UNIX_EPOCH)
    }

    fn catalog(products: &[Product]) -> HashMap<Uuid, Product> {
        products.iter().map(|p| (p.id, p.clone())).collect()
    }

    fn line(p: &Product, quantity: i32) -> LineRequest {
        LineRequest { product: p.id, quantity }
    }

    #[test]
    fn total_is_sum_of_line_subtotals() {
        let mug = product("Mug", 1299, 10);
        let kettle = product("Kettle", 4550, 2);
        let priced = price_lines(&[line(&mug, 3), line(&kettle, 2)], &catalog(&[mug.clone(), kettle.clone()]))
            .unwrap();

        assert_eq!(priced.total, Decimal::new(12997, 2));
        let sum: Decimal = priced.items.iter().filter_map(OrderItem::subtotal).sum();
        assert_eq!(priced.total, sum);
        assert_eq!(priced.items[0].name, "Mug");
        assert_eq!(priced.items[1].image, "https://img.local/Kettle.jpg");
        assert_eq!(priced.decrements, vec![(mug.id, 3), (kettle.id, 2)]);
    }

    #[test]
    fn first_failing_line_wins() {
        let mug = product("Mug", 1299, 1);
        let missing = Uuid::new_v4();
        let lines = [line(&mug, 5), LineRequest { product: missing, quantity: 1 }];

        let err = price_lines(&lines, &catalog(&[mug])).unwrap_err();
        assert_eq!(err, OrderError::InsufficientStock("Mug".into()));
        assert_eq!(err.to_string(), "Insufficient stock for Mug");
    }

    #[test]
    fn unknown_product_is_reported_by_id() {
        let missing = Uuid::new_v4();
        let err = price_lines(&[LineRequest { product: missing, quantity: 1 }], &HashMap::new())
            .unwrap_err();
        assert_eq!(err.to_string(), format!("Product not found: {missing}"));
    }

    #[test]
    fn oversized_totals_are_rejected() {
        let mut yacht = product("Yacht", 1, 10);
        yacht.price = Decimal::MAX;
        assert_eq!(price_lines(&[line(&yacht, 2)], &catalog(&[yacht.clone()])), Err(OrderError::TotalTooLarge));

        // each line fits a Decimal, the sum does not fit the stored column
        let mut villa = product("Villa", 1, 1_000);
        villa.price = Decimal::new(999_999_999_999, 2);
        let err = price_lines(&[line(&villa, 101)], &catalog(&[villa.clone()])).unwrap_err();
        assert_eq!(err.to_string(), "Order total is too large");

        let ok = price_lines(&[line(&villa, 99)], &catalog(&[villa])).unwrap();
        assert_eq!(ok.total, Decimal::new(98_999_999_999_901, 2));
    }

    #[test]
    fn repeated_lines_share_stock() {
        let mug = product("Mug", 500, 4);
        let cat = catalog(&[mug.clone()]);

        let ok = price_lines(&[line(&mug, 2), line(&mug, 2)], &cat).unwrap();
        assert_eq!(ok.decrements, vec![(mug.id, 4)]);
        assert_eq!(ok.items.len(), 2);

        let err = price_lines(&[line(&mug, 2), line(&mug, 3)], &cat).unwrap_err();
        assert_eq!(err, OrderError::InsufficientStock("Mug".into()));
    }

    #[test]
    fn rejects_empty_and_non_positive_quantities() {
        let mug = product("Mug", 500, 4);
        assert_eq!(price_lines(&[], &catalog(&[mug.clone()])), Err(OrderError::Empty));
        assert_eq!(
            price_lines(&[line(&mug, 0)], &catalog(&[mug.clone()])),
            Err(OrderError::InvalidQuantity(mug.id))
        );
        assert_eq!(
            price_lines(&[line(&mug, -2)], &catalog(&[mug.clone()])),
            Err(OrderError::InvalidQuantity(mug.id))
        );
    }

    #[test]
    fn order_number_format() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let n = generate_order_number(now);
        let parts: Vec<&str> = n.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1], "1700000000000");
        assert_eq!(parts[2].len(), ORDER_SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn shipping_requires_fields_and_defaults_country() {
        let full = ShippingAddressInput {
            name: Some(" Ada ".into()),
            address: Some("1 Loop St".into()),
            city: Some("London".into()),
            postal_code: Some("N1".into()),
            country: None,
        };
        let addr = normalize_shipping(Some(full)).unwrap();
        assert_eq!(addr.name, "Ada");
        assert_eq!(addr.country, DEFAULT_COUNTRY);

        let blank_city = ShippingAddressInput {
            name: Some("Ada".into()),
            address: Some("1 Loop St".into()),
            city: Some("  ".into()),
            postal_code: Some("N1".into()),
            country: Some("UK".into()),
        };
        assert_eq!(normalize_shipping(Some(blank_city)), Err(OrderError::MissingShipping));
        assert_eq!(normalize_shipping(None), Err(OrderError::MissingShipping));
    }

    #[test]
    fn status_update_rules() {
        let mug = product("Mug", 500, 4);
        let priced = price_lines(&[line(&mug, 1)], &catalog(&[mug])).unwrap();
        let mut order = Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            order_number: "ORD-1-AAAAAA".into(),
            items: priced.items,
            total_amount: priced.total,
            shipping_address: ShippingAddress {
                name: "Ada".into(),
                address: "1 Loop St".into(),
                city: "London".into(),
                postal_code: "N1".into(),
                country: "UK".into(),
            },
            payment_status: PaymentStatus::Completed,
            order_status: OrderStatus::Processing,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let now = OffsetDateTime::from_unix_timestamp(60).unwrap();

        assert_eq!(
            apply_status_update(&mut order, StatusUpdate::default(), now),
            Err(OrderError::NoStatusChange)
        );

        let ship = StatusUpdate { order_status: Some(OrderStatus::Shipped), payment_status: None };
        apply_status_update(&mut order, ship, now).unwrap();
        assert_eq!(order.order_status, OrderStatus::Shipped);
        assert_eq!(order.updated_at, now);

        let cancel = StatusUpdate { order_status: Some(OrderStatus::Cancelled), payment_status: Some(PaymentStatus::Refunded) };
        apply_status_update(&mut order, cancel, now).unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Refunded);

        let err = apply_status_update(&mut order, ship, now).unwrap_err();
        assert_eq!(err.to_string(), "Order is already cancelled");
    }
}

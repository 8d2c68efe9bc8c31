use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::repo_types::{
    NewOrder, Order, OrderItem, OrderItemRow, OrderRow, OrderStatus, PaymentStatus, StatusUpdate,
};
use super::services::PricedOrder;

const ORDER_COLUMNS: &str = r#"
    id, user_id, order_number, total_amount,
    shipping_name, shipping_address, shipping_city, shipping_postal_code, shipping_country,
    payment_status, order_status, created_at, updated_at
"#;

/// Insert an order and its items within a transaction.
pub async fn insert_tx(
    conn: &mut PgConnection,
    user_id: Uuid,
    order: NewOrder,
    priced: PricedOrder,
) -> Result<Order, sqlx::Error> {
    let addr = &order.shipping_address;
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        INSERT INTO orders (
            id, user_id, order_number, total_amount,
            shipping_name, shipping_address, shipping_city, shipping_postal_code, shipping_country,
            payment_status, order_status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {ORDER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&order.order_number)
    .bind(priced.total)
    .bind(&addr.name)
    .bind(&addr.address)
    .bind(&addr.city)
    .bind(&addr.postal_code)
    .bind(&addr.country)
    .bind(PaymentStatus::Completed)
    .bind(OrderStatus::Processing)
    .fetch_one(&mut *conn)
    .await?;

    for (position, item) in priced.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, position, product_id, name, price, quantity, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(row.id)
        .bind(position as i32)
        .bind(item.product)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .bind(&item.image)
        .execute(&mut *conn)
        .await?;
    }

    Ok(row.into_order(priced.items))
}

async fn attach_items(db: &PgPool, rows: Vec<OrderRow>) -> Result<Vec<Order>, sqlx::Error> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let item_rows = sqlx::query_as::<_, OrderItemRow>(
        r#"
        SELECT order_id, product_id, name, price, quantity, image
          FROM order_items
         WHERE order_id = ANY($1)
         ORDER BY order_id, position
        "#,
    )
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for r in item_rows {
        by_order.entry(r.order_id).or_default().push(r.into());
    }

    Ok(rows
        .into_iter()
        .map(|r| {
            let items = by_order.remove(&r.id).unwrap_or_default();
            r.into_order(items)
        })
        .collect())
}

/// Return the user's orders, newest first.
pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> Result<Vec<Order>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        r#"
        SELECT {ORDER_COLUMNS}
          FROM orders
         WHERE user_id = $1
         ORDER BY created_at DESC
        "#
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;
    attach_items(db, rows).await
}

pub async fn get_for_user(
    db: &PgPool,
    user_id: Uuid,
    order_id: Uuid,
) -> Result<Option<Order>, sqlx::Error> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    match row {
        Some(r) => Ok(attach_items(db, vec![r]).await?.pop()),
        None => Ok(None),
    }
}

/// Lock the order row so a status change is checked against the current value.
pub async fn lock_for_user_tx(
    conn: &mut PgConnection,
    user_id: Uuid,
    order_id: Uuid,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE"
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

pub async fn set_status_tx(
    conn: &mut PgConnection,
    order_id: Uuid,
    update: StatusUpdate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE orders
           SET order_status   = COALESCE($2, order_status),
               payment_status = COALESCE($3, payment_status),
               updated_at     = now()
         WHERE id = $1
        "#,
    )
    .bind(order_id)
    .bind(update.order_status)
    .bind(update.payment_status)
    .execute(conn)
    .await?;
    Ok(())
}

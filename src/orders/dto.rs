use serde::Deserialize;

use super::repo_types::{LineRequest, OrderStatus, PaymentStatus};

/// Shipping address as the checkout form sends it; every field may be blank.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddressInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateOrderRequest {
    pub items: Vec<LineRequest>,
    pub shipping_address: Option<ShippingAddressInput>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStatusRequest {
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of a user's saved cart, as the client last sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Uuid,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub image: String,
    pub quantity: i32,
}

//! Wire models for the Peony REST backend.
//!
//! All payloads are JSON over HTTPS. Prices are integer minor units.

use jiff::civil::Date;
use peony::{
    cart::{CartLine, CartSnapshot, DEFAULT_RESERVATION_TTL_SECONDS},
    ids::{DistrictId, OrderId, ProductId, SellerId},
};
use serde::{Deserialize, Serialize};

/// `GET /buyers/me/cart` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartResponse {
    pub items: Vec<CartLine>,

    /// Server-defined reservation TTL in seconds.
    #[serde(default = "default_reservation_ttl")]
    pub reservation_ttl: i64,
}

fn default_reservation_ttl() -> i64 {
    DEFAULT_RESERVATION_TTL_SECONDS
}

impl From<CartResponse> for CartSnapshot {
    fn from(response: CartResponse) -> Self {
        Self {
            lines: response.items,
            reservation_ttl_seconds: response.reservation_ttl,
        }
    }
}

/// `POST /buyers/me/cart/items` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preorder_delivery_date: Option<Date>,
}

/// `PUT /buyers/me/cart/items/{id}` request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// `POST /public/sellers/{id}/check-delivery` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryCheckRequest {
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district_id: Option<DistrictId>,
}

/// `POST /public/sellers/{id}/check-delivery` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryCheckResponse {
    pub delivers: bool,

    /// Delivery price in minor units; absent when the zone is not covered.
    #[serde(default)]
    pub delivery_price: Option<u64>,

    #[serde(default)]
    pub district_id: Option<DistrictId>,

    #[serde(default)]
    pub message: Option<String>,
}

/// One time window offered by a seller on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotWindow {
    pub time_from: String,
    pub time_to: String,
}

/// `GET /public/sellers/{id}/delivery-slots` entry: availability for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySlots {
    pub date: Date,
    pub windows: Vec<SlotWindow>,
}

/// One order created by a checkout call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub seller_id: SellerId,

    /// Order total in minor units, delivery included.
    pub total_price: u64,
}

/// `POST /buyers/me/cart/checkout` / `POST /orders/guest-checkout` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub orders: Vec<PlacedOrder>,
}

/// `POST /payments/create` / `POST /payments/guest/create` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub order_ids: Vec<OrderId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

/// Payment creation response: where to send the buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub confirmation_url: String,
}

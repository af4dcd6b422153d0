//! Checkout Assembly
//!
//! Turns the seller-grouped cart plus the buyer's delivery choices into the
//! multi-order submission payload. One order is placed per seller group; the
//! wire keeps the backend's Russian delivery-type values.

use jiff::{Timestamp, civil::Date};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{CartLine, SellerGroup, group_by_seller},
    ids::{DistrictId, ProductId, SellerId},
    reservation::ReservationClock,
};

/// How a seller group reaches the buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMethod {
    /// Courier delivery, priced by the seller's zone configuration.
    #[serde(rename = "Доставка")]
    Courier,

    /// Buyer collects from the seller.
    #[serde(rename = "Самовывоз")]
    Pickup,
}

/// A delivery time window chosen for one seller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverySlot {
    pub date: Date,
    pub time_from: String,
    pub time_to: String,
}

/// Per-seller delivery resolution state.
///
/// `price` stays `None` until the zone check completes; a Courier group with
/// no resolved price blocks assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerDelivery {
    pub method: DeliveryMethod,

    /// Resolved delivery price in minor units. Always `Some(0)` for pickup.
    pub price: Option<u64>,
    pub district_id: Option<DistrictId>,
    pub slot: Option<DeliverySlot>,
}

impl SellerDelivery {
    /// A pickup choice; costs nothing and needs no zone check.
    #[must_use]
    pub fn pickup() -> Self {
        Self {
            method: DeliveryMethod::Pickup,
            price: Some(0),
            district_id: None,
            slot: None,
        }
    }

    /// A resolved courier delivery.
    #[must_use]
    pub fn courier(price: u64, district_id: Option<DistrictId>) -> Self {
        Self {
            method: DeliveryMethod::Courier,
            price: Some(price),
            district_id,
            slot: None,
        }
    }
}

/// Buyer contact details entered on the checkout form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactInfo {
    pub fio: String,
    pub phone: String,
    pub address: String,
    pub comment: String,
    pub district_id: Option<DistrictId>,
    pub district_name: Option<String>,
}

/// Loyalty points spent against one seller's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsUsage {
    pub seller_id: SellerId,
    pub points: u64,
}

/// One `delivery_by_seller` wire entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerDeliveryEntry {
    pub seller_id: SellerId,
    pub delivery_type: DeliveryMethod,

    /// Delivery price in minor units; `0` for pickup.
    pub delivery_price: u64,
}

/// One `delivery_slots` wire entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerSlotEntry {
    pub seller_id: SellerId,
    pub date: Date,
    pub time_from: String,
    pub time_to: String,
}

/// The assembled order-placement payload for a registered buyer.
///
/// The backend resolves the buyer's server-side cart; only delivery choices
/// and contact details travel with the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub fio: String,
    pub phone: String,
    pub delivery_type: DeliveryMethod,
    pub address: String,
    pub comment: String,
    pub points_usage: Vec<PointsUsage>,
    pub delivery_by_seller: Vec<SellerDeliveryEntry>,
    pub delivery_slots: Vec<SellerSlotEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_district_id: Option<DistrictId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_district_name: Option<String>,
}

/// A line item carried inside a guest submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestItem {
    pub product_id: ProductId,
    pub seller_id: SellerId,
    pub quantity: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preorder_delivery_date: Option<Date>,
}

/// The assembled payload for a guest, with cart items inlined since no
/// server-side cart exists for an unauthenticated buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestCheckoutForm {
    #[serde(flatten)]
    pub form: CheckoutForm,
    pub items: Vec<GuestItem>,
}

/// Why a submission could not be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    /// No seller group has a line eligible for checkout.
    #[error("no lines eligible for checkout")]
    EmptyCart,

    /// A courier group lacks a resolved delivery price (or any delivery
    /// choice at all).
    #[error("delivery unresolved for seller {seller_id}")]
    IncompleteDelivery { seller_id: SellerId },
}

/// Assemble the registered-buyer submission.
///
/// Emits one [`SellerDeliveryEntry`] per group with at least one non-expired
/// line; groups whose reservations all lapsed are skipped. A group resolved
/// as courier must carry a delivery price, even if a UI guard already checked
/// — a null price is never sent.
///
/// # Errors
///
/// [`AssembleError::IncompleteDelivery`] when an included group has no
/// delivery choice or a priceless courier choice;
/// [`AssembleError::EmptyCart`] when no group qualifies.
pub fn assemble(
    groups: &[SellerGroup],
    deliveries: &FxHashMap<SellerId, SellerDelivery>,
    contact: &ContactInfo,
    points: &[PointsUsage],
    clock: &ReservationClock,
    now: Timestamp,
) -> Result<CheckoutForm, AssembleError> {
    let eligible: Vec<&SellerGroup> = groups
        .iter()
        .filter(|group| group.is_checkout_eligible(clock, now))
        .collect();

    build_form(&eligible, deliveries, contact, points)
}

/// Assemble the guest submission from local-only lines.
///
/// Guests hold no reservations, so every non-empty group is included and the
/// lines are inlined into the payload for the backend to re-validate.
///
/// # Errors
///
/// Same as [`assemble`].
pub fn assemble_guest(
    lines: &[CartLine],
    deliveries: &FxHashMap<SellerId, SellerDelivery>,
    contact: &ContactInfo,
    points: &[PointsUsage],
) -> Result<GuestCheckoutForm, AssembleError> {
    let groups = group_by_seller(lines);
    let included: Vec<&SellerGroup> = groups.iter().collect();

    let form = build_form(&included, deliveries, contact, points)?;

    let items = included
        .iter()
        .flat_map(|group| group.lines.iter())
        .map(|line| GuestItem {
            product_id: line.product_id,
            seller_id: line.seller_id,
            quantity: line.quantity,
            preorder_delivery_date: line.preorder_delivery_date,
        })
        .collect();

    Ok(GuestCheckoutForm { form, items })
}

fn build_form(
    groups: &[&SellerGroup],
    deliveries: &FxHashMap<SellerId, SellerDelivery>,
    contact: &ContactInfo,
    points: &[PointsUsage],
) -> Result<CheckoutForm, AssembleError> {
    let mut delivery_by_seller = Vec::with_capacity(groups.len());
    let mut delivery_slots = Vec::new();

    for group in groups {
        let seller_id = group.seller_id;

        let delivery = deliveries
            .get(&seller_id)
            .ok_or(AssembleError::IncompleteDelivery { seller_id })?;

        let delivery_price = match delivery.method {
            DeliveryMethod::Courier => delivery
                .price
                .ok_or(AssembleError::IncompleteDelivery { seller_id })?,
            DeliveryMethod::Pickup => 0,
        };

        delivery_by_seller.push(SellerDeliveryEntry {
            seller_id,
            delivery_type: delivery.method,
            delivery_price,
        });

        if let Some(slot) = &delivery.slot {
            delivery_slots.push(SellerSlotEntry {
                seller_id,
                date: slot.date,
                time_from: slot.time_from.clone(),
                time_to: slot.time_to.clone(),
            });
        }
    }

    if delivery_by_seller.is_empty() {
        return Err(AssembleError::EmptyCart);
    }

    let delivery_type = if delivery_by_seller
        .iter()
        .any(|entry| entry.delivery_type == DeliveryMethod::Courier)
    {
        DeliveryMethod::Courier
    } else {
        DeliveryMethod::Pickup
    };

    Ok(CheckoutForm {
        fio: contact.fio.clone(),
        phone: contact.phone.clone(),
        delivery_type,
        address: contact.address.clone(),
        comment: contact.comment.clone(),
        points_usage: points.to_vec(),
        delivery_by_seller,
        delivery_slots,
        buyer_district_id: contact.district_id,
        buyer_district_name: contact.district_name.clone(),
    })
}

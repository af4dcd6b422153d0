//! Cart
//!
//! The server owns the cart; the client holds a read-through snapshot of it.
//! This module defines the line items of that snapshot and the derived
//! seller-grouped view used by checkout.

use jiff::{Timestamp, civil::Date};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::{
    ids::{ProductId, SellerId},
    reservation::{ReservationClock, ReservationStatus},
};

/// Reservation TTL assumed until a cart snapshot says otherwise.
pub const DEFAULT_RESERVATION_TTL_SECONDS: i64 = 300;

/// One product held in the cart.
///
/// `reserved_at` is the server-issued timestamp of the stock hold; `None`
/// means no active reservation (e.g. an out-of-stock line kept for display).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub seller_id: SellerId,
    pub name: String,

    /// Unit price in minor currency units.
    pub price: u64,
    pub quantity: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_at: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preorder_delivery_date: Option<Date>,
}

impl CartLine {
    /// Price of the line: unit price times quantity, in minor units.
    #[must_use]
    pub fn line_total(&self) -> u64 {
        self.price * u64::from(self.quantity)
    }
}

/// The client's copy of the server cart, replaced wholesale on every load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,

    /// Server-defined reservation TTL, in seconds.
    pub reservation_ttl_seconds: i64,
}

impl CartSnapshot {
    /// An empty snapshot with the default TTL.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            reservation_ttl_seconds: DEFAULT_RESERVATION_TTL_SECONDS,
        }
    }

    /// A clock configured with this snapshot's TTL.
    #[must_use]
    pub fn clock(&self) -> ReservationClock {
        ReservationClock::new(self.reservation_ttl_seconds)
    }

    /// Sum of all line totals across sellers, in minor units.
    #[must_use]
    pub fn grand_total(&self) -> u64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

impl Default for CartSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// The lines of one seller, checked out as one order.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerGroup {
    pub seller_id: SellerId,
    pub lines: SmallVec<[CartLine; 2]>,
}

impl SellerGroup {
    /// Sum of the group's line totals, in minor units.
    #[must_use]
    pub fn subtotal(&self) -> u64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Lines whose reservation is still live at `now`.
    pub fn eligible_lines<'a>(
        &'a self,
        clock: &'a ReservationClock,
        now: Timestamp,
    ) -> impl Iterator<Item = &'a CartLine> {
        self.lines
            .iter()
            .filter(move |line| clock.status(line.reserved_at, now).is_checkout_eligible())
    }

    /// Whether the group contributes an order to checkout at `now`.
    #[must_use]
    pub fn is_checkout_eligible(&self, clock: &ReservationClock, now: Timestamp) -> bool {
        self.eligible_lines(clock, now).next().is_some()
    }

    /// Status of each line in the group at `now`.
    pub fn line_statuses<'a>(
        &'a self,
        clock: &'a ReservationClock,
        now: Timestamp,
    ) -> impl Iterator<Item = (ProductId, ReservationStatus)> {
        self.lines
            .iter()
            .map(move |line| (line.product_id, clock.status(line.reserved_at, now)))
    }
}

/// Partition cart lines by seller, preserving first-seen seller order.
///
/// A pure projection: recomputed on every read, never cached.
#[must_use]
pub fn group_by_seller(lines: &[CartLine]) -> Vec<SellerGroup> {
    let mut groups: Vec<SellerGroup> = Vec::new();
    let mut index: FxHashMap<SellerId, usize> = FxHashMap::default();

    for line in lines {
        if let Some(&at) = index.get(&line.seller_id) {
            if let Some(group) = groups.get_mut(at) {
                group.lines.push(line.clone());
            }
        } else {
            index.insert(line.seller_id, groups.len());
            groups.push(SellerGroup {
                seller_id: line.seller_id,
                lines: smallvec![line.clone()],
            });
        }
    }

    groups
}

//! Reservation Clock
//!
//! A stock hold is a server-side decrement with a TTL. The clock turns the
//! hold's `reserved_at` timestamp into a remaining-time value and a status.
//! It is a pure function of wall-clock time: the caller recomputes it on a
//! periodic tick, the clock itself holds no timer.

use jiff::Timestamp;

/// Default warning window, as a fraction of the TTL (the last 20%).
const DEFAULT_WARNING_DIVISOR: i64 = 5;

/// Checkout eligibility of a single cart line's stock hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    /// No reservation exists for the line (e.g. an out-of-stock item kept
    /// around for display). Distinct from [`Self::Expired`], but equally
    /// ineligible for checkout.
    NotReserved,

    /// The hold is comfortably within its TTL.
    Active,

    /// The hold is inside the warning window before expiry.
    Expiring,

    /// The TTL has elapsed; the line must be re-added to check out.
    Expired,
}

impl ReservationStatus {
    /// Whether a line with this status may be included in a checkout
    /// submission.
    #[must_use]
    pub fn is_checkout_eligible(self) -> bool {
        matches!(self, Self::Active | Self::Expiring)
    }
}

/// Converts reservation timestamps into remaining time and status.
///
/// The TTL is server-defined and arrives with the cart snapshot; it is never
/// configured locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationClock {
    ttl_seconds: i64,
    warning_seconds: i64,
}

impl ReservationClock {
    /// Build a clock for the given TTL, warning over the last 20% of it.
    #[must_use]
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            ttl_seconds,
            warning_seconds: ttl_seconds / DEFAULT_WARNING_DIVISOR,
        }
    }

    /// Build a clock with an explicit warning window.
    #[must_use]
    pub fn with_warning(ttl_seconds: i64, warning_seconds: i64) -> Self {
        Self {
            ttl_seconds,
            warning_seconds,
        }
    }

    /// The server-defined TTL in seconds.
    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Seconds left on the hold: `max(0, ttl - (now - reserved_at))`.
    ///
    /// Returns `0` when the hold is expired or absent. A `reserved_at` ahead
    /// of `now` (server clock slightly in front) clamps to the full TTL.
    #[must_use]
    pub fn remaining_seconds(&self, reserved_at: Option<Timestamp>, now: Timestamp) -> i64 {
        let Some(reserved_at) = reserved_at else {
            return 0;
        };

        let elapsed = now.as_second() - reserved_at.as_second();

        (self.ttl_seconds - elapsed).clamp(0, self.ttl_seconds)
    }

    /// Status of a hold at `now`.
    #[must_use]
    pub fn status(&self, reserved_at: Option<Timestamp>, now: Timestamp) -> ReservationStatus {
        if reserved_at.is_none() {
            return ReservationStatus::NotReserved;
        }

        match self.remaining_seconds(reserved_at, now) {
            0 => ReservationStatus::Expired,
            remaining if remaining <= self.warning_seconds => ReservationStatus::Expiring,
            _ => ReservationStatus::Active,
        }
    }
}

//! Peony
//!
//! Pure domain logic for the Peony flower-shop buyer client: reservation
//! countdowns, seller-grouped cart views and multi-order checkout assembly.
//! Everything here is a pure function of its inputs; network I/O lives in
//! `peony-client`.

pub mod cart;
pub mod checkout;
pub mod ids;
pub mod money;
pub mod reservation;

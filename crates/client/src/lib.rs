//! Peony buyer client
//!
//! Async service layer over the Peony REST backend: the typed HTTP client,
//! the cart aggregate with its reservation lifecycle, the checkout assembler
//! and the small UI-facing primitives (notifier, debouncer, countdown).

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod countdown;
pub mod debounce;
pub mod guest;
pub mod notify;
pub mod optimistic;

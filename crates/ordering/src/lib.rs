//! Order placement engine for the marketplace core.
//!
//! Sits between the HTTP surface and the catalog store: validates the cart
//! shape, drives the store's transactional check-and-decrement with a
//! bounded retry on transient conflicts, and hands settlement off to the
//! payment gateway strictly after commit.

pub mod engine;
pub mod error;
pub mod payment;

pub use engine::PlacementEngine;
pub use error::PlaceOrderError;
pub use payment::{InMemoryPaymentGateway, PaymentGateway, SettlementError};

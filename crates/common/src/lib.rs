//! Shared types for the fulfillment system.
//!
//! Identifiers are string newtypes so that product, warehouse, user and order
//! keys can never be mixed up. Id generation and time are injected through the
//! [`IdGenerator`] and [`Clock`] traits so callers (and tests) control them.

pub mod clock;
pub mod id_gen;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use id_gen::{IdGenerator, SequentialIdGenerator, UuidIdGenerator};
pub use types::{OrderId, ProductId, UserId, WarehouseId};

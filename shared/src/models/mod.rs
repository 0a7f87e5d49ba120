//! Data models
//!
//! Shared between booking-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Status enums are stored as TEXT, matching the wire representation.

pub mod reservation;
pub mod slot;

// Re-exports
pub use reservation::*;
pub use slot::*;

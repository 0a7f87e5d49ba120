//! Booking orchestration
//!
//! [`BookingCoordinator`] drives the three-layer protocol end to end:
//! idempotency check → hold validation → deposit charge → ledger commit →
//! compensation / cleanup. It is the only layer that translates internal
//! outcomes into user-visible results.

pub mod confirmation;
pub mod coordinator;

pub use coordinator::{BookingCoordinator, CancelResult};

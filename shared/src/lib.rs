//! Shared types for the BookTable booking platform
//!
//! Domain models, API request/response types and domain events shared
//! between the booking server and its clients. DB row derives are gated
//! behind the `db` feature so thin clients don't pull in sqlx.

pub mod event;
pub mod models;
pub mod request;
pub mod response;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use event::BookingEvent;
pub use models::{PaymentStatus, Reservation, ReservationStatus, SlotStatus, TimeSlot};

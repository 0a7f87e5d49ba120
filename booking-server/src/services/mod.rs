//! 服务模块 - 外部协作方
//!
//! - [`payment`] - 支付网关 (charge / refund)
//! - [`events`] - 领域事件发布 (fire-and-forget)

pub mod events;
pub mod payment;

pub use events::EventPublisher;
pub use payment::{DevPaymentGateway, HttpPaymentGateway, PaymentError, PaymentGateway};

//! Core order lifecycle for the storefront.
//!
//! The lifecycle rules (`lifecycle`, `cancellation`), the customer-facing
//! projections (`progress`, `timeline`) and the staff views (`work_queue`,
//! `reporting`) are pure functions of an order snapshot and an instant. The
//! [`OrderEngine`] is the only part that touches storage; it applies those
//! rules under compare-and-swap so concurrent writers to one order never both
//! commit.

pub mod builder;
pub mod cancellation;
pub mod clock;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod progress;
pub mod reporting;
pub mod timeline;
pub mod work_queue;

pub use builder::{BuilderError, EngineBuilder, EngineFactories};
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::OrderEngine;
pub use error::{CancelRejection, LifecycleError};

#[cfg(test)]
pub(crate) mod test_support {
	use chrono::{DateTime, Utc};
	use rust_decimal_macros::dec;
	use storefront_types::{LineItem, Order, OrderStatus, PaymentMethod};

	/// 2026-10-16 08:00:00 UTC.
	pub fn t0() -> DateTime<Utc> {
		"2026-10-16T08:00:00Z".parse().unwrap()
	}

	/// A one-item order created at [`t0`].
	pub fn order(payment_method: PaymentMethod, status: OrderStatus) -> Order {
		Order {
			id: "order-1".to_string(),
			customer_id: "customer-1".to_string(),
			status,
			payment_method,
			created_at: t0(),
			updated_at: t0(),
			payment_completed_at: None,
			items: vec![LineItem {
				name: "Banh mi".to_string(),
				quantity: 2,
				unit_price: dec!(25000),
				options_text: String::new(),
			}],
			total_amount: dec!(50000),
			note: None,
			version: 0,
		}
	}
}

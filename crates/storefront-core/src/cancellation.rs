//! Customer cancellation window.
//!
//! A customer may cancel a `PREPARING` order for [`CANCEL_WINDOW_SECONDS`]
//! after its anchor. The anchor is the creation time, except for card orders
//! whose payment has been captured: those are measured from the capture, so a
//! slow payment page does not eat into the customer's window.
//!
//! Elapsed time is counted in whole seconds, floored. The remaining time is
//! therefore the ceiling of the true remainder and reaches zero exactly at
//! the boundary.

use chrono::{DateTime, Duration, Utc};
use storefront_types::{CancellationAnchor, CancellationWindow, Order, OrderStatus, PaymentMethod};

use crate::error::CancelRejection;

/// Length of the cancellation window.
pub const CANCEL_WINDOW_SECONDS: i64 = 60;

/// Picks the instant the window is measured from.
pub fn anchor(order: &Order) -> CancellationAnchor {
	match (order.payment_method, order.payment_completed_at) {
		(PaymentMethod::Card, Some(paid_at)) => CancellationAnchor::PaymentCompleted(paid_at),
		_ => CancellationAnchor::Created(order.created_at),
	}
}

/// Whole seconds left in the window at `now`. Never negative.
///
/// A `now` before the anchor counts as no time elapsed.
pub fn remaining_seconds(order: &Order, now: DateTime<Utc>) -> u64 {
	let elapsed = (now - anchor(order).at()).num_seconds().max(0);
	// Bounded by the window, so the cast cannot wrap.
	(CANCEL_WINDOW_SECONDS - elapsed).max(0) as u64
}

/// Returns true if the customer may cancel at `now`.
pub fn is_eligible(order: &Order, now: DateTime<Utc>) -> bool {
	check(order, now).is_ok()
}

/// Explains why a cancellation at `now` would be refused.
///
/// A wrong status is reported even when the window has also run out.
pub fn check(order: &Order, now: DateTime<Utc>) -> Result<(), CancelRejection> {
	if order.status != OrderStatus::Preparing {
		return Err(CancelRejection::WrongStatus(order.status));
	}
	if remaining_seconds(order, now) == 0 {
		return Err(CancelRejection::WindowExpired);
	}
	Ok(())
}

/// Countdown and eligibility computed from a single `now`.
pub fn evaluate(order: &Order, now: DateTime<Utc>) -> CancellationWindow {
	let anchor = anchor(order);
	let remaining = remaining_seconds(order, now);

	CancellationWindow {
		order_id: order.id.clone(),
		anchor,
		remaining_seconds: remaining,
		eligible: order.status == OrderStatus::Preparing && remaining > 0,
		deadline: anchor.at() + Duration::seconds(CANCEL_WINDOW_SECONDS),
	}
}

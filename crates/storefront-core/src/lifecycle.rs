//! Order state machine.
//!
//! Orders move forward through PREPARING -> READY -> DELIVERING -> COMPLETED,
//! one staff step at a time. The only side exit is a customer cancellation
//! from PREPARING. Every function here mutates an in-memory snapshot; the
//! engine decides when a mutated snapshot is committed.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use storefront_types::{NewOrder, Order, OrderStatus, PaymentMethod};

use crate::cancellation;
use crate::error::LifecycleError;

/// Static transition table, each status maps to its allowed next statuses.
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	HashMap::from([
		(
			OrderStatus::Preparing,
			HashSet::from([OrderStatus::Ready, OrderStatus::Cancelled]),
		),
		(OrderStatus::Ready, HashSet::from([OrderStatus::Delivering])),
		(OrderStatus::Delivering, HashSet::from([OrderStatus::Completed])),
		(OrderStatus::Completed, HashSet::new()), // terminal
		(OrderStatus::Cancelled, HashSet::new()), // terminal
	])
});

/// The single forward step staff can take from `status`.
pub fn next_status(status: OrderStatus) -> Option<OrderStatus> {
	match status {
		OrderStatus::Preparing => Some(OrderStatus::Ready),
		OrderStatus::Ready => Some(OrderStatus::Delivering),
		OrderStatus::Delivering => Some(OrderStatus::Completed),
		OrderStatus::Completed | OrderStatus::Cancelled => None,
	}
}

/// Checks if a state transition is in the table.
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
	TRANSITIONS
		.get(&from)
		.is_some_and(|allowed| allowed.contains(&to))
}

/// Moves the order one step forward. Timestamps are left alone.
pub fn advance(order: &mut Order) -> Result<OrderStatus, LifecycleError> {
	let from = order.status;
	let to = next_status(from)
		.filter(|to| is_valid_transition(from, *to))
		.ok_or(LifecycleError::InvalidTransition { from })?;
	order.status = to;
	Ok(to)
}

/// Cancels the order if the customer is still allowed to.
pub fn cancel(order: &mut Order, now: DateTime<Utc>) -> Result<(), LifecycleError> {
	cancellation::check(order, now)?;
	debug_assert!(is_valid_transition(order.status, OrderStatus::Cancelled));
	order.status = OrderStatus::Cancelled;
	Ok(())
}

/// Records the payment capture reported by the provider.
pub fn confirm_payment(order: &mut Order, paid_at: DateTime<Utc>) -> Result<(), LifecycleError> {
	if order.payment_method == PaymentMethod::Cash {
		return Err(LifecycleError::PaymentRejected(
			"cash orders are paid on delivery".to_string(),
		));
	}
	if order.payment_completed_at.is_some() {
		return Err(LifecycleError::PaymentRejected(
			"payment already confirmed".to_string(),
		));
	}
	if order.is_terminal() {
		return Err(LifecycleError::PaymentRejected(format!(
			"order is already {}",
			order.status
		)));
	}
	if paid_at < order.created_at {
		return Err(LifecycleError::PaymentRejected(
			"payment cannot precede order creation".to_string(),
		));
	}

	order.payment_completed_at = Some(paid_at);
	Ok(())
}

/// Builds a fresh `PREPARING` order from a checkout payload.
pub fn place(id: String, new_order: NewOrder, now: DateTime<Utc>) -> Result<Order, LifecycleError> {
	if new_order.customer_id.trim().is_empty() {
		return Err(LifecycleError::InvalidQuery(
			"customer_id cannot be empty".to_string(),
		));
	}
	if new_order.items.is_empty() {
		return Err(LifecycleError::InvalidQuery(
			"an order needs at least one item".to_string(),
		));
	}
	if let Some(item) = new_order.items.iter().find(|item| item.quantity == 0) {
		return Err(LifecycleError::InvalidQuery(format!(
			"item '{}' has zero quantity",
			item.name
		)));
	}
	if let Some(item) = new_order
		.items
		.iter()
		.find(|item| item.unit_price.is_sign_negative())
	{
		return Err(LifecycleError::InvalidQuery(format!(
			"item '{}' has a negative price",
			item.name
		)));
	}

	let total_amount = new_order
		.items
		.iter()
		.try_fold(Decimal::ZERO, |total, item| {
			item.line_total().and_then(|line| total.checked_add(line))
		})
		.ok_or_else(|| LifecycleError::InvalidQuery("order total is out of range".to_string()))?;

	Ok(Order {
		id,
		customer_id: new_order.customer_id,
		status: OrderStatus::Preparing,
		payment_method: new_order.payment_method,
		created_at: now,
		updated_at: now,
		payment_completed_at: None,
		items: new_order.items,
		total_amount,
		note: new_order.note.filter(|note| !note.trim().is_empty()),
		version: 0,
	})
}

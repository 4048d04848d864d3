//! Errors surfaced by lifecycle operations.

use storefront_storage::StorageError;
use storefront_types::OrderStatus;
use thiserror::Error;

/// Why a cancellation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelRejection {
	/// The cancellation window has run out.
	#[error("cancellation window has expired")]
	WindowExpired,
	/// The order is no longer being prepared.
	#[error("order is {0}, only PREPARING orders can be cancelled")]
	WrongStatus(OrderStatus),
}

/// Errors that can occur while reading or mutating orders.
///
/// Every variant is something the caller can act on; nothing is clamped or
/// silently ignored.
#[derive(Debug, Error)]
pub enum LifecycleError {
	/// The order has no further forward step.
	#[error("No transition available from {from}")]
	InvalidTransition { from: OrderStatus },
	/// A guarded transition was refused.
	#[error("Transition not allowed: {0}")]
	TransitionNotAllowed(CancelRejection),
	#[error("Order not found: {0}")]
	NotFound(String),
	/// Another writer kept winning the compare-and-swap.
	#[error("Order {0} was modified concurrently")]
	ConcurrentModification(String),
	#[error("Payment rejected: {0}")]
	PaymentRejected(String),
	#[error("Invalid query: {0}")]
	InvalidQuery(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

impl LifecycleError {
	/// Maps a storage failure on `order_id` to the matching lifecycle error.
	pub(crate) fn from_storage(order_id: &str, err: StorageError) -> Self {
		match err {
			StorageError::NotFound => LifecycleError::NotFound(order_id.to_string()),
			StorageError::Conflict(_) => {
				LifecycleError::ConcurrentModification(order_id.to_string())
			},
			other => LifecycleError::Storage(other.to_string()),
		}
	}
}

impl From<CancelRejection> for LifecycleError {
	fn from(rejection: CancelRejection) -> Self {
		LifecycleError::TransitionNotAllowed(rejection)
	}
}

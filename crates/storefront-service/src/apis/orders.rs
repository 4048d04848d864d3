//! Customer-facing order endpoints.
//!
//! Order intake from checkout, the order snapshot, its cancellation countdown,
//! progress and timeline views, and the payment provider callback.

use storefront_core::{LifecycleError, OrderEngine};
use storefront_types::{
	truncate_id, CancellationWindow, CustomerOrderEntry, NewOrder, Order,
	PaymentConfirmationRequest, ProgressView, TimelineEvent,
};
use tracing::debug;

/// Accepts an order handed over by checkout.
pub async fn place_order(
	engine: &OrderEngine,
	new_order: NewOrder,
) -> Result<Order, LifecycleError> {
	engine.place_order(new_order).await
}

pub async fn get_order(engine: &OrderEngine, id: &str) -> Result<Order, LifecycleError> {
	engine.order(id).await
}

pub async fn get_cancellation(
	engine: &OrderEngine,
	id: &str,
) -> Result<CancellationWindow, LifecycleError> {
	engine.cancellation(id).await
}

/// Cancels on the customer's behalf.
///
/// The engine re-checks status and window against the stored record, so a
/// stale countdown on the client cannot cancel a late order.
pub async fn cancel_order(engine: &OrderEngine, id: &str) -> Result<Order, LifecycleError> {
	debug!(order_id = %truncate_id(id), "Cancellation requested");
	engine.cancel(id).await
}

/// Records a payment capture reported by the provider.
pub async fn confirm_payment(
	engine: &OrderEngine,
	id: &str,
	request: PaymentConfirmationRequest,
) -> Result<Order, LifecycleError> {
	engine.confirm_payment(id, request.paid_at).await
}

pub async fn get_progress(engine: &OrderEngine, id: &str) -> Result<ProgressView, LifecycleError> {
	engine.progress(id).await
}

pub async fn get_timeline(
	engine: &OrderEngine,
	id: &str,
	limit: Option<usize>,
) -> Result<Vec<TimelineEvent>, LifecycleError> {
	engine.timeline(id, limit).await
}

pub async fn customer_orders(
	engine: &OrderEngine,
	customer_id: &str,
) -> Result<Vec<CustomerOrderEntry>, LifecycleError> {
	engine.customer_orders(customer_id).await
}

//! Staff work-queue endpoints.

use storefront_core::{LifecycleError, OrderEngine};
use storefront_types::{
	truncate_id, DateQuery, Order, OrderSummary, Page, QueueCounts, WorkQueueQuery,
};
use tracing::debug;

/// One page of the queue for a status and day.
pub async fn list(
	engine: &OrderEngine,
	query: WorkQueueQuery,
) -> Result<Page<OrderSummary>, LifecycleError> {
	engine
		.list(query.status, query.date, query.page, query.page_size)
		.await
}

/// Badge counts for the queue tabs.
pub async fn counts(engine: &OrderEngine, query: DateQuery) -> Result<QueueCounts, LifecycleError> {
	engine.counts(query.date).await
}

/// Moves an order exactly one step forward.
pub async fn advance(engine: &OrderEngine, id: &str) -> Result<Order, LifecycleError> {
	debug!(order_id = %truncate_id(id), "Advance requested");
	engine.advance_one(id).await
}

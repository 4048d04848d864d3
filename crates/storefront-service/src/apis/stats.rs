//! Reporting endpoints.

use storefront_core::{LifecycleError, OrderEngine};
use storefront_types::{OrderReport, ReportQuery, RevenueSummary};

pub async fn revenue(
	engine: &OrderEngine,
	query: ReportQuery,
) -> Result<RevenueSummary, LifecycleError> {
	engine
		.revenue(query.from_date, query.to_date, query.status)
		.await
}

/// Detailed order listing over the same date range and status filter.
pub async fn orders(
	engine: &OrderEngine,
	query: ReportQuery,
) -> Result<OrderReport, LifecycleError> {
	engine
		.order_report(query.from_date, query.to_date, query.status)
		.await
}

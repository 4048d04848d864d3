//! Order engine.
//!
//! Binds storage, the clock and the lifecycle rules into the operations the
//! service exposes. Reads are projections of a stored snapshot at one `now`.
//! Writes follow a single discipline: read the record and its revision, apply
//! the guarded mutation to the snapshot, then compare-and-swap it back.
//! Status-keyed writes (advance, cancel) are bound to the status read at
//! operation start. If a lost race moved the status, the loser gets the typed
//! guard error for the new status and never applies its step to it. Only a
//! conflicting write that left the status alone (a payment capture) is
//! retried, once.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use storefront_storage::{StorageError, StorageService};
use storefront_types::{
	truncate_id, CancellationWindow, CustomerOrderEntry, NewOrder, Order, OrderReport,
	OrderStatus, OrderSummary, Page, ProgressView, QueueCounts, RevenueSummary, StorageKey,
	TimelineEvent,
};
use tracing::instrument;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CancelRejection, LifecycleError};
use crate::work_queue::{LocalCalendar, PagingLimits};
use crate::{cancellation, lifecycle, progress, reporting, timeline, work_queue};

/// Additional attempts after a lost compare-and-swap.
const CAS_RETRIES: usize = 1;

/// Engine for the order lifecycle.
pub struct OrderEngine {
	/// Storage service for persisting orders.
	storage: Arc<StorageService>,
	/// Source of `now` for every decision.
	clock: Arc<dyn Clock>,
	/// Local calendar used for day-scoped queries.
	calendar: LocalCalendar,
	/// Work-queue paging limits.
	paging: PagingLimits,
}

impl OrderEngine {
	pub fn new(
		storage: Arc<StorageService>,
		clock: Arc<dyn Clock>,
		calendar: LocalCalendar,
		paging: PagingLimits,
	) -> Self {
		Self {
			storage,
			clock,
			calendar,
			paging,
		}
	}

	/// Returns the current instant from the engine's clock.
	pub fn now(&self) -> DateTime<Utc> {
		self.clock.now()
	}

	/// Stores a new order in `PREPARING`.
	#[instrument(skip_all, fields(customer_id = %truncate_id(&new_order.customer_id)))]
	pub async fn place_order(&self, new_order: NewOrder) -> Result<Order, LifecycleError> {
		let now = self.clock.now();
		let order = lifecycle::place(Uuid::new_v4().to_string(), new_order, now)?;

		self.storage
			.store(StorageKey::Orders.as_str(), &order.id, &order)
			.await
			.map_err(|e| LifecycleError::from_storage(&order.id, e))?;

		tracing::info!(
			order_id = %truncate_id(&order.id),
			payment_method = %order.payment_method,
			total = %order.total_amount,
			"Order placed"
		);
		Ok(order)
	}

	/// Cancels an order on behalf of the customer.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn cancel(&self, order_id: &str) -> Result<Order, LifecycleError> {
		let (order, from) = self
			.mutate(
				order_id,
				StatusKey::Pinned(|status| CancelRejection::WrongStatus(status).into()),
				|order, now| lifecycle::cancel(order, now),
			)
			.await?;
		tracing::info!(from = %from, to = %order.status, "Order cancelled");
		Ok(order)
	}

	/// Moves an order one step along the work queue.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn advance_one(&self, order_id: &str) -> Result<Order, LifecycleError> {
		let (order, from) = self
			.mutate(
				order_id,
				StatusKey::Pinned(|status| LifecycleError::InvalidTransition { from: status }),
				|order, _| lifecycle::advance(order).map(|_| ()),
			)
			.await?;
		tracing::info!(from = %from, to = %order.status, "Order advanced");
		Ok(order)
	}

	/// Records a payment capture. `paid_at` defaults to now.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn confirm_payment(
		&self,
		order_id: &str,
		paid_at: Option<DateTime<Utc>>,
	) -> Result<Order, LifecycleError> {
		let (order, _) = self
			.mutate(order_id, StatusKey::Any, |order, now| {
				lifecycle::confirm_payment(order, paid_at.unwrap_or(now))
			})
			.await?;
		tracing::info!(paid_at = ?order.payment_completed_at, "Payment confirmed");
		Ok(order)
	}

	/// Current snapshot of an order.
	pub async fn order(&self, order_id: &str) -> Result<Order, LifecycleError> {
		self.storage
			.retrieve(StorageKey::Orders.as_str(), order_id)
			.await
			.map_err(|e| LifecycleError::from_storage(order_id, e))
	}

	pub async fn cancellation(&self, order_id: &str) -> Result<CancellationWindow, LifecycleError> {
		let order = self.order(order_id).await?;
		Ok(cancellation::evaluate(&order, self.clock.now()))
	}

	pub async fn progress(&self, order_id: &str) -> Result<ProgressView, LifecycleError> {
		let order = self.order(order_id).await?;
		Ok(progress::project(&order, self.clock.now()))
	}

	pub async fn timeline(
		&self,
		order_id: &str,
		limit: Option<usize>,
	) -> Result<Vec<TimelineEvent>, LifecycleError> {
		let order = self.order(order_id).await?;
		Ok(timeline::build(&order, self.clock.now(), limit))
	}

	/// One page of the work queue for `status` on `date` (today when absent).
	pub async fn list(
		&self,
		status: OrderStatus,
		date: Option<NaiveDate>,
		page: Option<usize>,
		page_size: Option<usize>,
	) -> Result<Page<OrderSummary>, LifecycleError> {
		let request = self.paging.resolve(page, page_size)?;
		let date = date.unwrap_or_else(|| self.calendar.today(self.clock.now()));
		let orders = self.all_orders().await?;
		Ok(work_queue::list(
			&orders,
			&self.calendar,
			status,
			date,
			request,
		))
	}

	/// Work-queue badge counts for `date` (today when absent).
	pub async fn counts(&self, date: Option<NaiveDate>) -> Result<QueueCounts, LifecycleError> {
		let date = date.unwrap_or_else(|| self.calendar.today(self.clock.now()));
		let orders = self.all_orders().await?;
		Ok(work_queue::counts(&orders, &self.calendar, date))
	}

	/// A customer's orders, newest first, each with its live countdown.
	pub async fn customer_orders(
		&self,
		customer_id: &str,
	) -> Result<Vec<CustomerOrderEntry>, LifecycleError> {
		let now = self.clock.now();
		let mut orders: Vec<Order> = self
			.all_orders()
			.await?
			.into_iter()
			.filter(|order| order.customer_id == customer_id)
			.collect();
		orders.sort_by(|a, b| {
			b.created_at
				.cmp(&a.created_at)
				.then_with(|| a.id.cmp(&b.id))
		});

		Ok(orders
			.iter()
			.map(|order| CustomerOrderEntry {
				summary: OrderSummary::from(order),
				cancellation: cancellation::evaluate(order, now),
			})
			.collect())
	}

	pub async fn revenue(
		&self,
		from: NaiveDate,
		to: NaiveDate,
		status: Option<OrderStatus>,
	) -> Result<RevenueSummary, LifecycleError> {
		let orders = self.all_orders().await?;
		reporting::revenue(&orders, &self.calendar, from, to, status)
	}

	/// Orders created over a local date range, newest first.
	pub async fn order_report(
		&self,
		from: NaiveDate,
		to: NaiveDate,
		status: Option<OrderStatus>,
	) -> Result<OrderReport, LifecycleError> {
		let orders = self.all_orders().await?;
		reporting::order_report(&orders, &self.calendar, from, to, status)
	}

	async fn all_orders(&self) -> Result<Vec<Order>, LifecycleError> {
		self.storage
			.retrieve_all(StorageKey::Orders.as_str())
			.await
			.map_err(|e| LifecycleError::Storage(e.to_string()))
	}

	/// Applies `mutation` to the stored order under compare-and-swap.
	///
	/// The mutation sees a fresh snapshot and a fresh `now` on every attempt.
	/// With [`StatusKey::Pinned`], a retry whose snapshot no longer has the
	/// status of the first read fails with the pinned error instead of
	/// mutating. Returns the committed order and the status it had before.
	async fn mutate<F>(
		&self,
		order_id: &str,
		key: StatusKey,
		mutation: F,
	) -> Result<(Order, OrderStatus), LifecycleError>
	where
		F: Fn(&mut Order, DateTime<Utc>) -> Result<(), LifecycleError>,
	{
		let namespace = StorageKey::Orders.as_str();
		let mut read_at_start = None;

		for attempt in 0..=CAS_RETRIES {
			let (mut order, revision) = self
				.storage
				.retrieve_with_revision::<Order>(namespace, order_id)
				.await
				.map_err(|e| LifecycleError::from_storage(order_id, e))?;

			let previous = order.status;
			match (key, read_at_start) {
				(StatusKey::Pinned(stale), Some(expected)) if expected != previous => {
					tracing::debug!(expected = %expected, found = %previous, "Status moved underneath");
					return Err(stale(previous));
				},
				_ => read_at_start = Some(previous),
			}

			let now = self.clock.now();
			mutation(&mut order, now)?;
			order.updated_at = now;
			order.version += 1;

			match self
				.storage
				.update_if_unchanged(namespace, order_id, &revision, &order)
				.await
			{
				Ok(_) => return Ok((order, previous)),
				Err(StorageError::Conflict(_)) => {
					tracing::debug!(attempt, "Order changed underneath, re-reading");
				},
				Err(e) => return Err(LifecycleError::from_storage(order_id, e)),
			}
		}

		tracing::warn!("Giving up after repeated concurrent modification");
		Err(LifecycleError::ConcurrentModification(order_id.to_string()))
	}
}

/// How a write relates to the status it was issued against.
#[derive(Clone, Copy)]
enum StatusKey {
	/// The write is a step from the status read at operation start. The
	/// function builds the error returned when a retry finds another status.
	Pinned(fn(OrderStatus) -> LifecycleError),
	/// The write does not depend on the status.
	Any,
}

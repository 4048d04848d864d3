//! Staff work-queue and reporting types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::OrderStatus;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
	pub results: Vec<T>,
	/// Number of matching rows across all pages.
	pub total_count: usize,
	pub has_next: bool,
	pub has_previous: bool,
	/// 1-based page number.
	pub page: usize,
	pub page_size: usize,
}

impl<T> Page<T> {
	/// Cuts one page out of an already ordered result set.
	///
	/// `page` is 1-based; callers validate that `page` and `page_size` are
	/// non-zero. A page past the end is empty but still reports the total.
	pub fn slice(rows: Vec<T>, page: usize, page_size: usize) -> Self {
		let total_count = rows.len();
		let start = page.saturating_sub(1).saturating_mul(page_size);
		let results: Vec<T> = rows.into_iter().skip(start).take(page_size).collect();
		let has_next = start.saturating_add(page_size) < total_count;

		Self {
			results,
			total_count,
			has_next,
			has_previous: page > 1,
			page,
			page_size,
		}
	}
}

/// Number of orders per work-queue status for one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
	#[serde(rename = "PREPARING")]
	pub preparing: usize,
	#[serde(rename = "READY")]
	pub ready: usize,
	#[serde(rename = "DELIVERING")]
	pub delivering: usize,
	#[serde(rename = "COMPLETED")]
	pub completed: usize,
}

impl QueueCounts {
	/// Adds one order to the matching badge. Cancelled orders are not queued.
	pub fn record(&mut self, status: OrderStatus) {
		match status {
			OrderStatus::Preparing => self.preparing += 1,
			OrderStatus::Ready => self.ready += 1,
			OrderStatus::Delivering => self.delivering += 1,
			OrderStatus::Completed => self.completed += 1,
			OrderStatus::Cancelled => {},
		}
	}
}

/// Revenue over an inclusive range of local calendar days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueSummary {
	pub total_orders: usize,
	pub total_revenue: Decimal,
	pub avg_per_day: Decimal,
	pub from_date: NaiveDate,
	pub to_date: NaiveDate,
	pub days: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<OrderStatus>,
}

/// One order in the detailed order report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReportRow {
	pub id: String,
	pub created_at: DateTime<Utc>,
	pub status: OrderStatus,
	pub total_amount: Decimal,
	/// Customer identifier.
	pub customer: String,
}

/// Orders created over a date range, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReport {
	pub orders: Vec<OrderReportRow>,
	/// Number of rows returned, after the row cap.
	pub total: usize,
}

/// Cancellation state of an order at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationWindow {
	pub order_id: String,
	pub anchor: CancellationAnchor,
	/// Whole seconds left, never negative.
	pub remaining_seconds: u64,
	pub eligible: bool,
	/// Instant at which the window closes.
	pub deadline: DateTime<Utc>,
}

/// The instant a cancellation window is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum CancellationAnchor {
	/// Order creation (cash, bank transfer, or card not yet captured).
	Created(DateTime<Utc>),
	/// Card payment capture.
	PaymentCompleted(DateTime<Utc>),
}

impl CancellationAnchor {
	/// The anchoring instant.
	pub fn at(&self) -> DateTime<Utc> {
		match self {
			CancellationAnchor::Created(at) | CancellationAnchor::PaymentCompleted(at) => *at,
		}
	}
}

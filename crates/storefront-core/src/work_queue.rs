//! Staff work queue.
//!
//! Staff work one calendar day at a time, so listings and counts are scoped to
//! orders created on a given local day. Active queues are worked oldest first;
//! finished orders are reviewed newest first.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use std::cmp::Ordering;
use storefront_types::{Order, OrderStatus, OrderSummary, Page, QueueCounts};

use crate::error::LifecycleError;

/// The storefront's local calendar.
#[derive(Debug, Clone, Copy)]
pub struct LocalCalendar {
	offset: FixedOffset,
}

impl LocalCalendar {
	/// Builds a calendar from an offset in minutes east of UTC.
	pub fn from_offset_minutes(minutes: i32) -> Result<Self, LifecycleError> {
		minutes
			.checked_mul(60)
			.and_then(FixedOffset::east_opt)
			.map(|offset| Self { offset })
			.ok_or_else(|| {
				LifecycleError::InvalidQuery(format!("invalid UTC offset: {} minutes", minutes))
			})
	}

	pub fn utc() -> Self {
		Self { offset: Utc.fix() }
	}

	/// Local calendar day of an instant.
	pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
		at.with_timezone(&self.offset).date_naive()
	}

	pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
		self.date_of(now)
	}
}

/// Resolved paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
	pub page: usize,
	pub page_size: usize,
}

/// Paging limits from configuration.
#[derive(Debug, Clone, Copy)]
pub struct PagingLimits {
	pub default_page_size: usize,
	pub max_page_size: usize,
}

impl PagingLimits {
	/// Applies defaults and caps to client paging input.
	///
	/// Zero for either value is rejected rather than corrected.
	pub fn resolve(
		&self,
		page: Option<usize>,
		page_size: Option<usize>,
	) -> Result<PageRequest, LifecycleError> {
		let page = page.unwrap_or(1);
		if page == 0 {
			return Err(LifecycleError::InvalidQuery(
				"page numbers start at 1".to_string(),
			));
		}
		let page_size = page_size.unwrap_or(self.default_page_size);
		if page_size == 0 {
			return Err(LifecycleError::InvalidQuery(
				"page_size must be at least 1".to_string(),
			));
		}
		Ok(PageRequest {
			page,
			page_size: page_size.min(self.max_page_size),
		})
	}
}

/// Display order of a status queue.
fn queue_order(status: OrderStatus, a: &Order, b: &Order) -> Ordering {
	let oldest_first = a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id));
	if status.is_active_work() {
		oldest_first
	} else {
		oldest_first.reverse()
	}
}

/// Lists one page of the queue for `status` on local day `date`.
pub fn list(
	orders: &[Order],
	calendar: &LocalCalendar,
	status: OrderStatus,
	date: NaiveDate,
	request: PageRequest,
) -> Page<OrderSummary> {
	let mut matching: Vec<&Order> = orders
		.iter()
		.filter(|order| order.status == status && calendar.date_of(order.created_at) == date)
		.collect();
	matching.sort_by(|a, b| queue_order(status, a, b));

	let rows = matching.into_iter().map(OrderSummary::from).collect();
	Page::slice(rows, request.page, request.page_size)
}

/// Per-status counts for local day `date`.
pub fn counts(orders: &[Order], calendar: &LocalCalendar, date: NaiveDate) -> QueueCounts {
	orders
		.iter()
		.filter(|order| calendar.date_of(order.created_at) == date)
		.fold(QueueCounts::default(), |mut counts, order| {
			counts.record(order.status);
			counts
		})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{order, t0};
	use chrono::Duration;
	use storefront_types::PaymentMethod;

	fn at(status: OrderStatus, id: &str, offset_secs: i64) -> Order {
		let mut o = order(PaymentMethod::Cash, status);
		o.id = id.to_string();
		o.created_at = t0() + Duration::seconds(offset_secs);
		o
	}

	fn ids(page: &Page<OrderSummary>) -> Vec<&str> {
		page.results.iter().map(|s| s.id.as_str()).collect()
	}

	const ALL_ON_ONE_PAGE: PageRequest = PageRequest {
		page: 1,
		page_size: 50,
	};

	#[test]
	fn test_active_queue_oldest_first() {
		let orders = vec![
			at(OrderStatus::Ready, "c", 10),
			at(OrderStatus::Ready, "a", 0),
			at(OrderStatus::Ready, "b", 5),
			at(OrderStatus::Preparing, "x", 1),
		];
		let page = list(
			&orders,
			&LocalCalendar::utc(),
			OrderStatus::Ready,
			t0().date_naive(),
			ALL_ON_ONE_PAGE,
		);
		assert_eq!(ids(&page), vec!["a", "b", "c"]);
		assert_eq!(page.total_count, 3);
	}

	#[test]
	fn test_completed_queue_newest_first() {
		let orders = vec![
			at(OrderStatus::Completed, "a", 0),
			at(OrderStatus::Completed, "c", 10),
			at(OrderStatus::Completed, "b", 5),
		];
		let page = list(
			&orders,
			&LocalCalendar::utc(),
			OrderStatus::Completed,
			t0().date_naive(),
			ALL_ON_ONE_PAGE,
		);
		assert_eq!(ids(&page), vec!["c", "b", "a"]);
	}

	#[test]
	fn test_equal_timestamps_break_ties_by_id() {
		let orders = vec![
			at(OrderStatus::Preparing, "b", 0),
			at(OrderStatus::Preparing, "a", 0),
		];
		let page = list(
			&orders,
			&LocalCalendar::utc(),
			OrderStatus::Preparing,
			t0().date_naive(),
			ALL_ON_ONE_PAGE,
		);
		assert_eq!(ids(&page), vec!["a", "b"]);
	}

	#[test]
	fn test_day_filter_uses_local_offset() {
		// t0 is 08:00 UTC; 17 hours later is 01:00 UTC next day, but still
		// the same day at UTC-5.
		let orders = vec![
			at(OrderStatus::Preparing, "early", 0),
			at(OrderStatus::Preparing, "late", 17 * 3600),
		];
		let day = t0().date_naive();

		let utc = list(
			&orders,
			&LocalCalendar::utc(),
			OrderStatus::Preparing,
			day,
			ALL_ON_ONE_PAGE,
		);
		assert_eq!(ids(&utc), vec!["early"]);

		let west = LocalCalendar::from_offset_minutes(-300).unwrap();
		let local = list(&orders, &west, OrderStatus::Preparing, day, ALL_ON_ONE_PAGE);
		assert_eq!(ids(&local), vec!["early", "late"]);
	}

	#[test]
	fn test_counts_independent_of_paging() {
		let mut orders = vec![
			at(OrderStatus::Preparing, "p1", 0),
			at(OrderStatus::Preparing, "p2", 1),
			at(OrderStatus::Delivering, "d1", 2),
			at(OrderStatus::Cancelled, "x1", 3),
		];
		for i in 0..5 {
			orders.push(at(OrderStatus::Completed, &format!("c{}", i), 10 + i));
		}
		// Another day entirely.
		orders.push(at(OrderStatus::Preparing, "old", -2 * 86_400));

		let counts = counts(&orders, &LocalCalendar::utc(), t0().date_naive());
		assert_eq!(
			counts,
			QueueCounts {
				preparing: 2,
				ready: 0,
				delivering: 1,
				completed: 5,
			}
		);

		let page = list(
			&orders,
			&LocalCalendar::utc(),
			OrderStatus::Completed,
			t0().date_naive(),
			PageRequest {
				page: 2,
				page_size: 2,
			},
		);
		assert_eq!(page.total_count, 5);
		assert_eq!(ids(&page), vec!["c2", "c1"]);
		assert!(page.has_next && page.has_previous);
	}

	#[test]
	fn test_paging_limits() {
		let limits = PagingLimits {
			default_page_size: 10,
			max_page_size: 100,
		};
		assert_eq!(
			limits.resolve(None, None).unwrap(),
			PageRequest {
				page: 1,
				page_size: 10
			}
		);
		assert_eq!(limits.resolve(Some(3), Some(500)).unwrap().page_size, 100);
		assert!(matches!(
			limits.resolve(Some(0), None),
			Err(LifecycleError::InvalidQuery(_))
		));
		assert!(limits.resolve(None, Some(0)).is_err());
	}

	#[test]
	fn test_offset_bounds() {
		assert!(LocalCalendar::from_offset_minutes(420).is_ok());
		assert!(LocalCalendar::from_offset_minutes(24 * 60).is_err());
	}
}

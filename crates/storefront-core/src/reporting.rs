//! Revenue statistics and order reports over local calendar days.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use storefront_types::{Order, OrderReport, OrderReportRow, OrderStatus, RevenueSummary};

use crate::error::LifecycleError;
use crate::work_queue::LocalCalendar;

/// Most rows an order report returns.
pub const ORDER_REPORT_LIMIT: usize = 100;

/// Orders created between `from` and `to` (both inclusive, local days),
/// optionally restricted to one status.
fn in_range<'a>(
	orders: &'a [Order],
	calendar: &'a LocalCalendar,
	from: NaiveDate,
	to: NaiveDate,
	status: Option<OrderStatus>,
) -> Result<impl Iterator<Item = &'a Order> + 'a, LifecycleError> {
	if from > to {
		return Err(LifecycleError::InvalidQuery(format!(
			"from_date {} is after to_date {}",
			from, to
		)));
	}

	Ok(orders.iter().filter(move |order| {
		let day = calendar.date_of(order.created_at);
		day >= from && day <= to && status.is_none_or(|status| order.status == status)
	}))
}

/// Sums orders created between `from` and `to` (both inclusive, local days),
/// optionally restricted to one status.
pub fn revenue(
	orders: &[Order],
	calendar: &LocalCalendar,
	from: NaiveDate,
	to: NaiveDate,
	status: Option<OrderStatus>,
) -> Result<RevenueSummary, LifecycleError> {
	let (total_orders, total_revenue) = in_range(orders, calendar, from, to, status)?
		.try_fold((0usize, Decimal::ZERO), |(count, sum), order| {
			sum.checked_add(order.total_amount)
				.map(|sum| (count + 1, sum))
		})
		.ok_or_else(|| LifecycleError::InvalidQuery("revenue is out of range".to_string()))?;

	// Inclusive range, so never zero.
	let days = u32::try_from((to - from).num_days() + 1)
		.map_err(|_| LifecycleError::InvalidQuery("date range too large".to_string()))?;

	Ok(RevenueSummary {
		total_orders,
		total_revenue,
		avg_per_day: (total_revenue / Decimal::from(days)).round_dp(2),
		from_date: from,
		to_date: to,
		days,
		status,
	})
}

/// Lists orders created between `from` and `to`, newest first, capped at
/// [`ORDER_REPORT_LIMIT`] rows.
pub fn order_report(
	orders: &[Order],
	calendar: &LocalCalendar,
	from: NaiveDate,
	to: NaiveDate,
	status: Option<OrderStatus>,
) -> Result<OrderReport, LifecycleError> {
	let mut matching: Vec<&Order> = in_range(orders, calendar, from, to, status)?.collect();
	// Ties on created_at fall back to id so repeated reports agree.
	matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
	matching.truncate(ORDER_REPORT_LIMIT);

	let orders: Vec<OrderReportRow> = matching
		.into_iter()
		.map(|order| OrderReportRow {
			id: order.id.clone(),
			created_at: order.created_at,
			status: order.status,
			total_amount: order.total_amount,
			customer: order.customer_id.clone(),
		})
		.collect();

	Ok(OrderReport {
		total: orders.len(),
		orders,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{order, t0};
	use chrono::Duration;
	use rust_decimal_macros::dec;
	use storefront_types::PaymentMethod;

	fn priced(status: OrderStatus, days_after: i64, total: Decimal) -> Order {
		let mut o = order(PaymentMethod::Cash, status);
		o.created_at = t0() + Duration::days(days_after);
		o.total_amount = total;
		o
	}

	#[test]
	fn test_revenue_over_range() {
		let orders = vec![
			priced(OrderStatus::Completed, 0, dec!(100)),
			priced(OrderStatus::Completed, 1, dec!(50)),
			priced(OrderStatus::Cancelled, 1, dec!(70)),
			priced(OrderStatus::Completed, 5, dec!(999)),
		];
		let from = t0().date_naive();
		let to = from + Duration::days(2);

		let all = revenue(&orders, &LocalCalendar::utc(), from, to, None).unwrap();
		assert_eq!(all.total_orders, 3);
		assert_eq!(all.total_revenue, dec!(220));
		assert_eq!(all.days, 3);
		assert_eq!(all.avg_per_day, dec!(73.33));

		let completed = revenue(
			&orders,
			&LocalCalendar::utc(),
			from,
			to,
			Some(OrderStatus::Completed),
		)
		.unwrap();
		assert_eq!(completed.total_orders, 2);
		assert_eq!(completed.total_revenue, dec!(150));
		assert_eq!(completed.avg_per_day, dec!(50));
	}

	#[test]
	fn test_single_day_and_empty_range() {
		let day = t0().date_naive();
		let summary = revenue(&[], &LocalCalendar::utc(), day, day, None).unwrap();
		assert_eq!(summary.days, 1);
		assert_eq!(summary.total_revenue, Decimal::ZERO);
		assert_eq!(summary.avg_per_day, Decimal::ZERO);
	}

	#[test]
	fn test_reversed_range_rejected() {
		let day = t0().date_naive();
		let result = revenue(
			&[],
			&LocalCalendar::utc(),
			day,
			day - Duration::days(1),
			None,
		);
		assert!(matches!(result, Err(LifecycleError::InvalidQuery(_))));
	}

	#[test]
	fn test_order_report_newest_first() {
		let mut orders = vec![
			priced(OrderStatus::Completed, 0, dec!(100)),
			priced(OrderStatus::Cancelled, 2, dec!(70)),
			priced(OrderStatus::Completed, 1, dec!(50)),
			priced(OrderStatus::Completed, 9, dec!(999)),
		];
		for (index, order) in orders.iter_mut().enumerate() {
			order.id = format!("order-{}", index);
			order.customer_id = format!("customer-{}", index);
		}
		let from = t0().date_naive();
		let to = from + Duration::days(2);

		let report = order_report(&orders, &LocalCalendar::utc(), from, to, None).unwrap();
		assert_eq!(report.total, 3);
		let ids: Vec<_> = report.orders.iter().map(|row| row.id.as_str()).collect();
		assert_eq!(ids, vec!["order-1", "order-2", "order-0"]);
		assert_eq!(report.orders[0].customer, "customer-1");
		assert_eq!(report.orders[0].status, OrderStatus::Cancelled);
		assert_eq!(report.orders[0].total_amount, dec!(70));

		let completed = order_report(
			&orders,
			&LocalCalendar::utc(),
			from,
			to,
			Some(OrderStatus::Completed),
		)
		.unwrap();
		let ids: Vec<_> = completed.orders.iter().map(|row| row.id.as_str()).collect();
		assert_eq!(ids, vec!["order-2", "order-0"]);
	}

	#[test]
	fn test_order_report_capped() {
		let orders: Vec<Order> = (0..ORDER_REPORT_LIMIT + 20)
			.map(|index| {
				let mut o = priced(OrderStatus::Preparing, 0, dec!(10));
				o.id = format!("order-{:03}", index);
				o.created_at += Duration::seconds(index as i64);
				o
			})
			.collect();
		let day = t0().date_naive();

		let report = order_report(&orders, &LocalCalendar::utc(), day, day, None).unwrap();
		assert_eq!(report.total, ORDER_REPORT_LIMIT);
		assert_eq!(report.orders.len(), ORDER_REPORT_LIMIT);
		assert_eq!(report.orders[0].id, "order-119");
		assert_eq!(report.orders[ORDER_REPORT_LIMIT - 1].id, "order-020");
	}

	#[test]
	fn test_order_report_uses_local_days() {
		// 23:30 UTC is already the next day at UTC+1.
		let mut late = priced(OrderStatus::Completed, 0, dec!(10));
		late.created_at = t0() + Duration::minutes(15 * 60 + 30);
		let utc_day = t0().date_naive();

		let utc = order_report(
			std::slice::from_ref(&late),
			&LocalCalendar::utc(),
			utc_day,
			utc_day,
			None,
		)
		.unwrap();
		assert_eq!(utc.total, 1);

		let shifted = LocalCalendar::from_offset_minutes(60).unwrap();
		let local = order_report(
			std::slice::from_ref(&late),
			&shifted,
			utc_day,
			utc_day,
			None,
		)
		.unwrap();
		assert_eq!(local.total, 0);
	}

	#[test]
	fn test_order_report_reversed_range_rejected() {
		let day = t0().date_naive();
		let result = order_report(&[], &LocalCalendar::utc(), day, day - Duration::days(1), None);
		assert!(matches!(result, Err(LifecycleError::InvalidQuery(_))));
	}
}

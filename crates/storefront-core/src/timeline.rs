//! Reconstructed order timeline.
//!
//! Only creation is a recorded instant; the other events are placed at fixed
//! offsets from it. Events are returned newest first.

use chrono::{DateTime, Duration, Utc};
use storefront_types::{EventTone, Order, OrderStatus, TimelineEvent, TimelineKind};

use crate::cancellation::CANCEL_WINDOW_SECONDS;

/// Number of events the compact timeline shows.
pub const COMPACT_TIMELINE_LEN: usize = 6;

const CONFIRMED_MAX_OFFSET_SECONDS: i64 = 300;
const READY_OFFSET_MINUTES: i64 = 60;
const DELIVERING_OFFSET_MINUTES: i64 = 90;
const HUB_AFTER_DELIVERING_MINUTES: i64 = 30;
const DELIVERED_OFFSET_MINUTES: i64 = 120;

fn event(
	timestamp: DateTime<Utc>,
	kind: TimelineKind,
	title: &str,
	description: &str,
	tone: EventTone,
) -> TimelineEvent {
	TimelineEvent {
		timestamp,
		kind,
		title: title.to_string(),
		description: description.to_string(),
		tone,
	}
}

/// Builds the timeline of `order` as seen at `now`, optionally keeping only
/// the `limit` most recent events.
pub fn build(order: &Order, now: DateTime<Utc>, limit: Option<usize>) -> Vec<TimelineEvent> {
	let created = order.created_at;
	let status = order.status;
	let elapsed = (now - created).max(Duration::zero());

	let mut events = vec![event(
		created,
		TimelineKind::Placed,
		"Order placed",
		"Your order has been received",
		EventTone::Done,
	)];

	if status == OrderStatus::Cancelled {
		events.push(event(
			order.updated_at,
			TimelineKind::Cancelled,
			"Order cancelled",
			"The order was cancelled and will not be prepared",
			EventTone::Cancelled,
		));
	} else {
		if status != OrderStatus::Preparing || elapsed > Duration::seconds(CANCEL_WINDOW_SECONDS) {
			events.push(event(
				created + elapsed.min(Duration::seconds(CONFIRMED_MAX_OFFSET_SECONDS)),
				TimelineKind::Confirmed,
				"Confirmed",
				"The order is confirmed and being prepared",
				EventTone::Done,
			));
		}

		if matches!(
			status,
			OrderStatus::Ready | OrderStatus::Delivering | OrderStatus::Completed
		) {
			events.push(event(
				created + Duration::minutes(READY_OFFSET_MINUTES),
				TimelineKind::Ready,
				"Ready for delivery",
				"The order is packed and waiting for a courier",
				EventTone::Done,
			));
		}

		if matches!(status, OrderStatus::Delivering | OrderStatus::Completed) {
			let delivering_at = created + Duration::minutes(DELIVERING_OFFSET_MINUTES);
			let delivering = status == OrderStatus::Delivering;
			events.push(event(
				delivering_at,
				TimelineKind::Delivering,
				"Out for delivery",
				"The order is on its way, please keep your phone nearby",
				if delivering {
					EventTone::Active
				} else {
					EventTone::Done
				},
			));

			if delivering {
				events.push(event(
					delivering_at + Duration::minutes(HUB_AFTER_DELIVERING_MINUTES),
					TimelineKind::ArrivedAtHub,
					"Arrived at delivery hub",
					"The order reached the hub in your area and will be delivered within 12 hours",
					EventTone::Active,
				));
			}
		}

		if status == OrderStatus::Completed {
			events.push(event(
				created + Duration::minutes(DELIVERED_OFFSET_MINUTES),
				TimelineKind::Delivered,
				"Delivered",
				"Delivered successfully",
				EventTone::Success,
			));
		}
	}

	// Newest first; on equal timestamps the later stage comes first.
	events.sort_by(|a, b| {
		b.timestamp
			.cmp(&a.timestamp)
			.then_with(|| b.kind.rank().cmp(&a.kind.rank()))
	});

	if let Some(limit) = limit {
		events.truncate(limit);
	}
	events
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{order, t0};
	use storefront_types::PaymentMethod;

	fn kinds(events: &[TimelineEvent]) -> Vec<TimelineKind> {
		events.iter().map(|e| e.kind).collect()
	}

	#[test]
	fn test_fresh_order_only_placed() {
		let o = order(PaymentMethod::Cash, OrderStatus::Preparing);
		let events = build(&o, t0() + Duration::seconds(30), None);
		assert_eq!(kinds(&events), vec![TimelineKind::Placed]);
		assert_eq!(events[0].timestamp, t0());
	}

	#[test]
	fn test_confirmed_offset_tracks_elapsed_up_to_five_minutes() {
		let o = order(PaymentMethod::Cash, OrderStatus::Preparing);

		let events = build(&o, t0() + Duration::seconds(90), None);
		assert_eq!(
			kinds(&events),
			vec![TimelineKind::Confirmed, TimelineKind::Placed]
		);
		assert_eq!(events[0].timestamp, t0() + Duration::seconds(90));

		let events = build(&o, t0() + Duration::hours(2), None);
		assert_eq!(events[0].timestamp, t0() + Duration::minutes(5));
	}

	#[test]
	fn test_delivering_order() {
		let o = order(PaymentMethod::Card, OrderStatus::Delivering);
		let events = build(&o, t0() + Duration::hours(3), None);

		assert_eq!(
			kinds(&events),
			vec![
				TimelineKind::ArrivedAtHub,
				TimelineKind::Delivering,
				TimelineKind::Ready,
				TimelineKind::Confirmed,
				TimelineKind::Placed,
			]
		);
		assert_eq!(events[0].timestamp, t0() + Duration::minutes(120));
		assert_eq!(events[1].tone, EventTone::Active);
		assert_eq!(events[2].timestamp, t0() + Duration::minutes(60));
	}

	#[test]
	fn test_completed_order_has_no_hub_event() {
		let o = order(PaymentMethod::Cash, OrderStatus::Completed);
		let events = build(&o, t0() + Duration::hours(3), None);

		assert_eq!(
			kinds(&events),
			vec![
				TimelineKind::Delivered,
				TimelineKind::Delivering,
				TimelineKind::Ready,
				TimelineKind::Confirmed,
				TimelineKind::Placed,
			]
		);
		assert_eq!(events[0].tone, EventTone::Success);
		assert_eq!(events[1].tone, EventTone::Done);
	}

	#[test]
	fn test_ties_put_later_stage_first() {
		// Advanced immediately: confirmed lands on the creation instant.
		let o = order(PaymentMethod::Cash, OrderStatus::Ready);
		let events = build(&o, t0(), None);
		assert_eq!(
			kinds(&events),
			vec![
				TimelineKind::Ready,
				TimelineKind::Confirmed,
				TimelineKind::Placed
			]
		);
	}

	#[test]
	fn test_cancelled_order() {
		let mut o = order(PaymentMethod::Cash, OrderStatus::Cancelled);
		o.updated_at = t0() + Duration::seconds(20);

		let events = build(&o, t0() + Duration::hours(1), None);
		assert_eq!(
			kinds(&events),
			vec![TimelineKind::Cancelled, TimelineKind::Placed]
		);
		assert_eq!(events[0].timestamp, t0() + Duration::seconds(20));
		assert_eq!(events[0].tone, EventTone::Cancelled);
	}

	#[test]
	fn test_limit_keeps_most_recent() {
		let o = order(PaymentMethod::Cash, OrderStatus::Completed);
		let events = build(&o, t0() + Duration::hours(3), Some(2));
		assert_eq!(
			kinds(&events),
			vec![TimelineKind::Delivered, TimelineKind::Delivering]
		);
	}
}

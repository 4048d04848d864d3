//! Five-stage progress bar shown to customers.
//!
//! `PREPARING` is split into PLACED and CONFIRMED purely by age: an order
//! older than the cancellation window is shown as confirmed. Nothing extra is
//! persisted for this; the stage is a function of status, creation time and
//! `now`.

use chrono::{DateTime, Duration, Utc};
use storefront_types::{Order, OrderStatus, ProgressView, Stage, StageState, StageView};

use crate::cancellation::CANCEL_WINDOW_SECONDS;

/// Offset of the displayed confirmation time from creation.
pub const CONFIRMED_DISPLAY_OFFSET_MINUTES: i64 = 5;

/// Displayed timestamp per stage.
///
/// Orders do not record when each transition happened, so [`estimate`]
/// fills in fixed offsets from creation. Recorded times, when a caller has
/// them, are layered on top with [`StageTimestamps::with`].
///
/// [`estimate`]: StageTimestamps::estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTimestamps([DateTime<Utc>; 5]);

impl StageTimestamps {
	pub fn estimate(order: &Order) -> Self {
		let created = order.created_at;
		Self([
			created,
			created + Duration::minutes(CONFIRMED_DISPLAY_OFFSET_MINUTES),
			created,
			created,
			created,
		])
	}

	/// Replaces the estimate for one stage.
	pub fn with(mut self, stage: Stage, at: DateTime<Utc>) -> Self {
		self.0[stage.index()] = at;
		self
	}

	pub fn get(&self, stage: Stage) -> DateTime<Utc> {
		self.0[stage.index()]
	}
}

/// The stage an order is currently in, or `None` for cancelled orders.
pub fn current_stage(order: &Order, now: DateTime<Utc>) -> Option<Stage> {
	match order.status {
		OrderStatus::Cancelled => None,
		OrderStatus::Preparing => {
			if now - order.created_at > Duration::seconds(CANCEL_WINDOW_SECONDS) {
				Some(Stage::Confirmed)
			} else {
				Some(Stage::Placed)
			}
		},
		OrderStatus::Ready => Some(Stage::Ready),
		OrderStatus::Delivering => Some(Stage::Delivering),
		OrderStatus::Completed => Some(Stage::Completed),
	}
}

/// Projects the progress bar using estimated stage timestamps.
pub fn project(order: &Order, now: DateTime<Utc>) -> ProgressView {
	project_with(order, now, &StageTimestamps::estimate(order))
}

/// Projects the progress bar with explicit stage timestamps.
pub fn project_with(order: &Order, now: DateTime<Utc>, timestamps: &StageTimestamps) -> ProgressView {
	let Some(current) = current_stage(order, now) else {
		return ProgressView {
			order_id: order.id.clone(),
			current_stage_index: -1,
			completed_stage_keys: Vec::new(),
			stages: Vec::new(),
		};
	};

	let stages = Stage::ALL
		.iter()
		.map(|stage| {
			let state = match stage.index().cmp(&current.index()) {
				std::cmp::Ordering::Less => StageState::Completed,
				std::cmp::Ordering::Equal => StageState::Current,
				std::cmp::Ordering::Greater => StageState::Upcoming,
			};
			StageView {
				stage: *stage,
				label: stage.label().to_string(),
				state,
				timestamp: (stage.index() <= current.index()).then(|| timestamps.get(*stage)),
			}
		})
		.collect();

	ProgressView {
		order_id: order.id.clone(),
		// At most 4, fits.
		current_stage_index: current.index() as i8,
		completed_stage_keys: Stage::ALL[..=current.index()].to_vec(),
		stages,
	}
}

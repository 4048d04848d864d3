//! Customer-facing progress and timeline types.
//!
//! The backend only knows five statuses. Customers see five *stages*, a
//! presentation refinement that splits `PREPARING` into "placed" and
//! "confirmed". These types carry the projected view; the projection itself
//! lives in the core crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A customer-facing progress milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
	Placed,
	Confirmed,
	Ready,
	Delivering,
	Completed,
}

impl Stage {
	/// All stages in display order.
	pub const ALL: [Stage; 5] = [
		Stage::Placed,
		Stage::Confirmed,
		Stage::Ready,
		Stage::Delivering,
		Stage::Completed,
	];

	/// Zero-based position of the stage in the progress bar.
	pub fn index(&self) -> usize {
		match self {
			Stage::Placed => 0,
			Stage::Confirmed => 1,
			Stage::Ready => 2,
			Stage::Delivering => 3,
			Stage::Completed => 4,
		}
	}

	/// Stable key used by clients.
	pub fn key(&self) -> &'static str {
		match self {
			Stage::Placed => "PLACED",
			Stage::Confirmed => "CONFIRMED",
			Stage::Ready => "READY",
			Stage::Delivering => "DELIVERING",
			Stage::Completed => "COMPLETED",
		}
	}

	/// Human readable label.
	pub fn label(&self) -> &'static str {
		match self {
			Stage::Placed => "Order placed",
			Stage::Confirmed => "Confirmed",
			Stage::Ready => "Ready for delivery",
			Stage::Delivering => "Out for delivery",
			Stage::Completed => "Completed",
		}
	}

	/// Looks a stage up by its position.
	pub fn from_index(index: usize) -> Option<Stage> {
		Stage::ALL.get(index).copied()
	}
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}

/// Where a stage sits relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
	Completed,
	Current,
	Upcoming,
}

/// One step of the progress bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageView {
	pub stage: Stage,
	pub label: String,
	pub state: StageState,
	/// Only present for stages at or before the current one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<DateTime<Utc>>,
}

/// Projected progress of one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressView {
	pub order_id: String,
	/// `-1` when the view is suppressed (cancelled orders), `0..=4` otherwise.
	pub current_stage_index: i8,
	/// Stages at or before the current one, in order.
	pub completed_stage_keys: Vec<Stage>,
	/// Every stage, in order. Empty when suppressed.
	pub stages: Vec<StageView>,
}

impl ProgressView {
	/// Returns true when there is nothing to show (cancelled orders).
	pub fn is_suppressed(&self) -> bool {
		self.current_stage_index < 0
	}

	/// The current stage, if any.
	pub fn current_stage(&self) -> Option<Stage> {
		usize::try_from(self.current_stage_index)
			.ok()
			.and_then(Stage::from_index)
	}

	/// Displayed timestamp of a stage, absent for upcoming stages.
	pub fn stage_timestamp(&self, stage: Stage) -> Option<DateTime<Utc>> {
		self.stages
			.iter()
			.find(|view| view.stage == stage)
			.and_then(|view| view.timestamp)
	}
}

/// Kind of a reconstructed timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
	Placed,
	Confirmed,
	Ready,
	Delivering,
	ArrivedAtHub,
	Delivered,
	Cancelled,
}

impl TimelineKind {
	/// Position of the event in the lifecycle, used to order events that
	/// share a timestamp.
	pub fn rank(&self) -> u8 {
		match self {
			TimelineKind::Placed => 0,
			TimelineKind::Confirmed => 1,
			TimelineKind::Ready => 2,
			TimelineKind::Delivering => 3,
			TimelineKind::ArrivedAtHub => 4,
			TimelineKind::Delivered => 5,
			TimelineKind::Cancelled => 6,
		}
	}
}

/// Visual emphasis of a timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTone {
	/// A milestone already behind the order.
	Done,
	/// What is happening right now.
	Active,
	/// Successful delivery.
	Success,
	/// The order was cancelled.
	Cancelled,
}

/// One entry of the customer timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
	pub timestamp: DateTime<Utc>,
	pub kind: TimelineKind,
	pub title: String,
	pub description: String,
	pub tone: EventTone,
}

//! Time source for every window and projection decision.
//!
//! Nothing in the core reads the system time directly. Operations take one
//! `now` from the [`Clock`] at their start and use it for every decision they
//! make, so a countdown and its eligibility flag can never disagree.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current instant.
pub trait Clock: Send + Sync {
	fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// A clock that only moves when told to.
///
/// Stored as milliseconds since the epoch so it can be shared between tasks
/// without a lock.
#[derive(Debug)]
pub struct ManualClock {
	millis: AtomicI64,
}

impl ManualClock {
	pub fn new(start: DateTime<Utc>) -> Self {
		Self {
			millis: AtomicI64::new(start.timestamp_millis()),
		}
	}

	/// Moves the clock forward (or backward, for a negative duration).
	pub fn advance(&self, by: Duration) {
		self.millis
			.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
	}

	pub fn set(&self, to: DateTime<Utc>) {
		self.millis.store(to.timestamp_millis(), Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> DateTime<Utc> {
		let millis = self.millis.load(Ordering::SeqCst);
		Utc.timestamp_millis_opt(millis)
			.single()
			.unwrap_or(DateTime::<Utc>::MIN_UTC)
	}
}

//! Time sources for expiring caches and the tenant handler registry.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub trait Clock: Send + Sync {
	fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// Clock that only moves when told to. Used by tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
	now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
	pub fn new(start: DateTime<Utc>) -> Self {
		Self { now: Mutex::new(start) }
	}

	pub fn set(&self, now: DateTime<Utc>) {
		*self.now.lock() = now;
	}

	pub fn advance(&self, duration: Duration) {
		let mut now = self.now.lock();
		*now += to_time_delta(duration);
	}
}

impl Default for ManualClock {
	fn default() -> Self {
		Self::new(Utc::now())
	}
}

impl Clock for ManualClock {
	fn now(&self) -> DateTime<Utc> {
		*self.now.lock()
	}
}

pub fn system_clock() -> Arc<dyn Clock> {
	Arc::new(SystemClock)
}

/// Saturating conversion, durations beyond chrono's range mean "forever"
pub fn to_time_delta(duration: Duration) -> TimeDelta {
	TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

/// `now + duration`, saturating at the maximum representable time
pub fn expiry_after(now: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
	now.checked_add_signed(to_time_delta(duration)).unwrap_or(DateTime::<Utc>::MAX_UTC)
}


// vim: ts=4

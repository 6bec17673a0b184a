//! Time source abstraction so TTL and cooldown decisions can be driven deterministically.

// self
use crate::_prelude::*;

/// Source of the current UTC instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;
}

/// Returns the process clock wrapped for sharing.
pub fn system_clock() -> Arc<dyn Clock> {
	Arc::new(SystemClock)
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
	current: Mutex<OffsetDateTime>,
}
impl ManualClock {
	/// Creates a clock frozen at `initial`.
	pub fn new(initial: OffsetDateTime) -> Self {
		Self { current: Mutex::new(initial) }
	}

	/// Moves the clock forward (or backward, for negative durations).
	pub fn advance(&self, delta: Duration) {
		let mut current = self.current.lock();

		*current += delta;
	}

	/// Jumps to an absolute instant.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.current.lock() = instant;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.current.lock()
	}
}

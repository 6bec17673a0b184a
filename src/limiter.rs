//! Refresh attempt limiter.
//!
//! The counter only changes through [`RefreshLimiter::record_attempt`] and
//! [`RefreshLimiter::reset`]; [`RefreshLimiter::can_attempt`] is a pure query that treats an
//! elapsed cooldown as an empty window without writing anything back.

// self
use crate::_prelude::*;

#[derive(Clone, Copy, Debug, Default)]
struct LimiterState {
	count: u32,
	last_attempt_at: Option<OffsetDateTime>,
}
impl LimiterState {
	fn cooled_down(&self, now: OffsetDateTime, cooldown: Duration) -> bool {
		self.last_attempt_at.is_some_and(|last| now - last > cooldown)
	}

	fn effective_count(&self, now: OffsetDateTime, cooldown: Duration) -> u32 {
		if self.cooled_down(now, cooldown) { 0 } else { self.count }
	}
}

/// Caps refresh attempts per cooldown window measured from the most recent attempt.
#[derive(Debug)]
pub struct RefreshLimiter {
	max_attempts: u32,
	cooldown: Duration,
	state: Mutex<LimiterState>,
}
impl RefreshLimiter {
	/// Creates a limiter allowing `max_attempts` per `cooldown`.
	pub fn new(max_attempts: u32, cooldown: Duration) -> Self {
		Self { max_attempts, cooldown, state: Mutex::new(LimiterState::default()) }
	}

	/// Returns `true` while fewer than `max_attempts` attempts count against the current window.
	pub fn can_attempt(&self, now: OffsetDateTime) -> bool {
		self.state.lock().effective_count(now, self.cooldown) < self.max_attempts
	}

	/// Counts one attempt at `now`, starting a fresh window first when the previous one elapsed.
	///
	/// Returns the attempt number within the current window.
	pub fn record_attempt(&self, now: OffsetDateTime) -> u32 {
		let mut state = self.state.lock();

		if state.cooled_down(now, self.cooldown) {
			state.count = 0;
		}

		state.count = state.count.saturating_add(1);
		state.last_attempt_at = Some(now);

		state.count
	}

	/// Forgets every recorded attempt.
	pub fn reset(&self) {
		*self.state.lock() = LimiterState::default();
	}

	/// Attempts counting against the window at `now`.
	pub fn attempts_at(&self, now: OffsetDateTime) -> u32 {
		self.state.lock().effective_count(now, self.cooldown)
	}

	/// Raw counter value, ignoring cooldown.
	pub fn recorded_attempts(&self) -> u32 {
		self.state.lock().count
	}

	/// Instant of the most recent attempt, if any.
	pub fn last_attempt_at(&self) -> Option<OffsetDateTime> {
		self.state.lock().last_attempt_at
	}
}

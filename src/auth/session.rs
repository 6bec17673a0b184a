//! Bearer-token session records and their lifetime math.

// self
use crate::{_prelude::*, auth::Secret};

/// Lifecycle status of a session relative to a TTL and a proactive refresh threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
	/// Token is valid and outside the refresh threshold.
	Active,
	/// Token is still valid but close enough to expiry that it should be renewed.
	RefreshDue,
	/// Token outlived the session TTL.
	Expired,
}

/// Bearer token paired with the instant it was obtained.
///
/// The pairing is what enforces the "token only changes together with its login timestamp"
/// invariant: stores accept and return whole records.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
	/// Bearer token; callers must avoid logging it.
	pub token: Secret,
	/// Instant of the login that produced `token`.
	pub login_at: OffsetDateTime,
}
impl SessionRecord {
	/// Pairs a token with its login instant.
	pub fn new(token: impl Into<Secret>, login_at: OffsetDateTime) -> Self {
		Self { token: token.into(), login_at }
	}

	/// Instant at which the session stops being valid, or `None` when it lies beyond the
	/// representable range.
	pub fn expires_at(&self, ttl: Duration) -> Option<OffsetDateTime> {
		self.login_at.checked_add(ttl)
	}

	/// Time left before expiry; negative once expired, zero for a login stamped in the future.
	pub fn remaining_at(&self, now: OffsetDateTime, ttl: Duration) -> Duration {
		if self.login_at > now {
			return Duration::ZERO;
		}

		ttl.saturating_sub(now - self.login_at)
	}

	/// Returns `true` while `0 <= now - login_at < ttl`.
	///
	/// A login instant ahead of `now` (clock skew, corrupted storage) never counts as valid.
	pub fn is_valid_at(&self, now: OffsetDateTime, ttl: Duration) -> bool {
		self.login_at <= now && now - self.login_at < ttl
	}

	/// Computes the status at `now`.
	pub fn status_at(
		&self,
		now: OffsetDateTime,
		ttl: Duration,
		refresh_threshold: Duration,
	) -> SessionStatus {
		if !self.is_valid_at(now, ttl) {
			return SessionStatus::Expired;
		}
		if self.remaining_at(now, ttl) <= refresh_threshold {
			return SessionStatus::RefreshDue;
		}

		SessionStatus::Active
	}
}
impl Debug for SessionRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionRecord")
			.field("token", &"<redacted>")
			.field("login_at", &self.login_at)
			.finish()
	}
}

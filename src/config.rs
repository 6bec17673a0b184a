//! Refresh policy knobs: session lifetime, proactive threshold, retry depth, and rate limits.

// self
use crate::{_prelude::*, error::ConfigError};

/// Timing and budget constants consulted by the token provider and the authenticator.
///
/// Values are fixed for the lifetime of an authenticator; build a new one to change them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshPolicy {
	/// Maximum age of a token since login before it is considered expired.
	pub session_ttl: Duration,
	/// Window before expiry inside which a still-valid token should be renewed.
	pub refresh_threshold: Duration,
	/// How many times one logical request may be retried after an auth challenge.
	pub max_retry_depth: usize,
	/// Refresh attempts allowed per cooldown window.
	pub max_attempts: u32,
	/// Window after which the attempt counter starts over.
	pub cooldown: Duration,
}
impl RefreshPolicy {
	/// Production session lifetime.
	pub const DEFAULT_SESSION_TTL: Duration = Duration::hours(1);
	/// Production proactive refresh window.
	pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::minutes(5);
	/// Never retry a request that was already retried once.
	pub const DEFAULT_MAX_RETRY_DEPTH: usize = 1;
	/// Attempts per cooldown window.
	pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
	/// Production cooldown window.
	pub const DEFAULT_COOLDOWN: Duration = Duration::seconds(60);

	/// Returns a builder seeded with the production defaults.
	pub fn builder() -> RefreshPolicyBuilder {
		RefreshPolicyBuilder::default()
	}

	/// Short-lived values used by test builds (10 second sessions, 5 second cooldown).
	pub fn testing() -> Self {
		Self {
			session_ttl: Duration::seconds(10),
			refresh_threshold: Duration::seconds(2),
			max_retry_depth: Self::DEFAULT_MAX_RETRY_DEPTH,
			max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
			cooldown: Duration::seconds(5),
		}
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if !self.session_ttl.is_positive() {
			return Err(ConfigError::InvalidPolicy { reason: "session TTL must be positive" });
		}
		if self.refresh_threshold.is_negative() {
			return Err(ConfigError::InvalidPolicy {
				reason: "refresh threshold must not be negative",
			});
		}
		if self.refresh_threshold >= self.session_ttl {
			return Err(ConfigError::InvalidPolicy {
				reason: "refresh threshold must be shorter than the session TTL",
			});
		}
		if self.max_attempts == 0 {
			return Err(ConfigError::InvalidPolicy { reason: "at least one attempt is required" });
		}
		if !self.cooldown.is_positive() {
			return Err(ConfigError::InvalidPolicy { reason: "cooldown must be positive" });
		}

		Ok(())
	}
}
impl Default for RefreshPolicy {
	fn default() -> Self {
		Self {
			session_ttl: Self::DEFAULT_SESSION_TTL,
			refresh_threshold: Self::DEFAULT_REFRESH_THRESHOLD,
			max_retry_depth: Self::DEFAULT_MAX_RETRY_DEPTH,
			max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
			cooldown: Self::DEFAULT_COOLDOWN,
		}
	}
}

/// Builder for [`RefreshPolicy`] values.
#[derive(Clone, Debug, Default)]
pub struct RefreshPolicyBuilder {
	policy: RefreshPolicy,
}
impl RefreshPolicyBuilder {
	/// Sets the session lifetime.
	pub fn session_ttl(mut self, ttl: Duration) -> Self {
		self.policy.session_ttl = ttl;

		self
	}

	/// Sets the proactive refresh window.
	pub fn refresh_threshold(mut self, threshold: Duration) -> Self {
		self.policy.refresh_threshold = threshold;

		self
	}

	/// Sets the retry depth cap; zero disables automatic retries entirely.
	pub fn max_retry_depth(mut self, depth: usize) -> Self {
		self.policy.max_retry_depth = depth;

		self
	}

	/// Sets the number of attempts allowed per cooldown window.
	pub fn max_attempts(mut self, attempts: u32) -> Self {
		self.policy.max_attempts = attempts;

		self
	}

	/// Sets the cooldown window.
	pub fn cooldown(mut self, cooldown: Duration) -> Self {
		self.policy.cooldown = cooldown;

		self
	}

	/// Consumes the builder and validates the resulting policy.
	pub fn build(self) -> Result<RefreshPolicy, ConfigError> {
		self.policy.validate()?;

		Ok(self.policy)
	}
}

//! Observability helpers for the authentication path.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit one structured event per decision point (field `decision`) and a
//!   `session_broker.refresh` span around each serialized refresh.
//! - Enable `metrics` to increment the `session_broker_decision_total` counter, labeled by
//!   `decision`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Decision points along the challenge → refresh → retry path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Decision {
	/// A 401/403 challenge reached the authenticator.
	ChallengeReceived,
	/// The response status is not an auth challenge.
	Ineligible,
	/// The request was already retried as often as the policy allows.
	RetryDepthExceeded,
	/// The refresh attempt budget is exhausted for the current window.
	RateLimited,
	/// Stored credentials are missing or blank.
	MissingCredentials,
	/// The failed request carried an outdated token; the stored one is reused.
	StaleTokenReused,
	/// A refresh finished while this caller waited; its outcome is reused.
	RefreshShared,
	/// A login call is about to be issued.
	RefreshAttempted,
	/// The login call produced a new token.
	RefreshSucceeded,
	/// The login call failed.
	RefreshFailed,
	/// Stored tokens and credentials were wiped.
	SessionCleared,
	/// The credential store failed; a conservative answer was used instead.
	StoreDegraded,
}
impl Decision {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Decision::ChallengeReceived => "challenge_received",
			Decision::Ineligible => "ineligible",
			Decision::RetryDepthExceeded => "retry_depth_exceeded",
			Decision::RateLimited => "rate_limited",
			Decision::MissingCredentials => "missing_credentials",
			Decision::StaleTokenReused => "stale_token_reused",
			Decision::RefreshShared => "refresh_shared",
			Decision::RefreshAttempted => "refresh_attempted",
			Decision::RefreshSucceeded => "refresh_succeeded",
			Decision::RefreshFailed => "refresh_failed",
			Decision::SessionCleared => "session_cleared",
			Decision::StoreDegraded => "store_degraded",
		}
	}

	/// Severity used when the decision is logged.
	pub const fn severity(self) -> Severity {
		match self {
			Decision::ChallengeReceived
			| Decision::Ineligible
			| Decision::StaleTokenReused
			| Decision::RefreshShared => Severity::Debug,
			Decision::RefreshAttempted | Decision::RefreshSucceeded => Severity::Info,
			Decision::RetryDepthExceeded
			| Decision::RateLimited
			| Decision::MissingCredentials
			| Decision::RefreshFailed
			| Decision::SessionCleared => Severity::Warn,
			Decision::StoreDegraded => Severity::Error,
		}
	}
}
impl Display for Decision {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Log levels used by [`record_decision`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
	/// Routine control flow.
	Debug,
	/// Network activity worth auditing.
	Info,
	/// Refusals and failures.
	Warn,
	/// Local faults.
	Error,
}

/// Records a decision point through every enabled backend.
pub fn record_decision(decision: Decision) {
	emit_decision(decision, None);
	count_decision(decision);
}

/// Records a decision point caused by `error`.
pub fn record_decision_error(decision: Decision, error: &dyn StdError) {
	emit_decision(decision, Some(error));
	count_decision(decision);
}

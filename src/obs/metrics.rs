// self
use crate::obs::Decision;

/// Increments the decision counter via the global metrics recorder (when enabled).
pub fn count_decision(decision: Decision) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("session_broker_decision_total", "decision" => decision.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = decision;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn count_decision_noop_without_recorder() {
		count_decision(Decision::RefreshAttempted);
	}
}

// self
use crate::{
	_prelude::*,
	obs::{Decision, Severity},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRefresh<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRefresh<F> = F;

/// Span wrapping one serialized refresh.
#[derive(Clone, Debug)]
pub struct RefreshSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RefreshSpan {
	/// Creates a span tagged with the challenge status and the request's retry depth.
	pub fn new(status: u16, depth: usize) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("session_broker.refresh", status, depth);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (status, depth);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRefresh<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a structured event for `decision` (when enabled).
pub fn emit_decision(decision: Decision, error: Option<&dyn StdError>) {
	#[cfg(feature = "tracing")]
	{
		let label = decision.as_str();

		match (decision.severity(), error) {
			(Severity::Debug, None) => tracing::debug!(decision = label, "auth decision"),
			(Severity::Debug, Some(error)) =>
				tracing::debug!(decision = label, error = %error, "auth decision"),
			(Severity::Info, None) => tracing::info!(decision = label, "auth decision"),
			(Severity::Info, Some(error)) =>
				tracing::info!(decision = label, error = %error, "auth decision"),
			(Severity::Warn, None) => tracing::warn!(decision = label, "auth decision"),
			(Severity::Warn, Some(error)) =>
				tracing::warn!(decision = label, error = %error, "auth decision"),
			(Severity::Error, None) => tracing::error!(decision = label, "auth decision"),
			(Severity::Error, Some(error)) =>
				tracing::error!(decision = label, error = %error, "auth decision"),
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (decision, error, Severity::Debug);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn emit_decision_without_subscriber() {
		emit_decision(Decision::StoreDegraded, None);
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = RefreshSpan::new(401, 0);
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}

// self
use crate::{_prelude::*, auth::TokenState, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by broker operations.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("obo_broker.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
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

/// Reports a cache blob that could not be read or parsed and is being treated as empty.
pub fn cache_fallback(key: &'static str, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(key, %error, "cache entry unusable, treating as empty");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, error);
	}
}

/// Reports a token cache write that failed after a successful exchange.
pub fn cache_write_failed(key: &'static str, error: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(key, %error, "failed to persist exchanged token");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (key, error);
	}
}

/// Reports which acquisition branch was taken.
pub fn acquisition_state(state: &TokenState) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(state = state.as_str(), "evaluated cached token");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = state;
	}
}

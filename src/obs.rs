//! Optional observability helpers for broker operations.
//!
//! # Feature Flags
//!
//! - `tracing` (default) emits structured spans named `obo_broker.flow` with the `flow` and
//!   `stage` fields, plus events for cache fallbacks and acquisition decisions.
//! - `metrics` increments the `obo_broker_flow_total` counter for every attempt/success/failure,
//!   labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Access token acquisition (cache lookup + optional exchange).
	Acquire,
	/// Single authenticated request.
	Fetch,
	/// Authenticated batch request.
	Batch,
	/// Skip-token cache lookup/update.
	SkipToken,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Acquire => "acquire",
			FlowKind::Fetch => "fetch",
			FlowKind::Batch => "batch",
			FlowKind::SkipToken => "skip_token",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

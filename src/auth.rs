//! Token models and the acquisition state machine.

pub mod record;
pub mod secret;
pub mod state;

pub use record::*;
pub use secret::*;
pub use state::*;

// self
use crate::_prelude::*;

/// Converts an instant into integer epoch milliseconds, the unit persisted in cache records.
pub fn epoch_millis(instant: OffsetDateTime) -> i64 {
	let millis = instant.unix_timestamp_nanos() / 1_000_000;

	i64::try_from(millis).unwrap_or(if millis.is_negative() { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn epoch_millis_truncates_sub_millisecond_precision() {
		let instant = macros::datetime!(2025-01-01 00:00:00.123_456 UTC);

		assert_eq!(epoch_millis(instant), 1_735_689_600_123);
	}
}

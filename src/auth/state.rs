//! Pure decision function behind token acquisition.
//!
//! [`TokenState::evaluate`] classifies the cached record (if any) into one of four states using
//! only timestamp arithmetic. The broker then either serves the cached access token or picks
//! the refresh token to exchange. Keeping the decision free of storage and transport code lets
//! every branch be exercised with plain numbers.

// self
use crate::{
	_prelude::*,
	auth::{record::CachedToken, secret::TokenSecret},
};

/// Seconds subtracted from `expires_in` before a cached access token counts as stale.
pub const FRESHNESS_MARGIN_SECS: i64 = 600;
/// Age (80 days, in milliseconds) after which a cached refresh token is assumed revoked.
pub const ROTATION_WINDOW_MILLIS: i64 = 6_912_000_000;

/// Logical acquisition state derived from cache contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenState {
	/// No usable record; exchange with the configured refresh token.
	NoCache,
	/// Cached access token is still inside its lifetime minus the safety margin.
	Fresh {
		/// Access token to serve without a network call.
		access_token: TokenSecret,
	},
	/// Access token is stale, but the cached refresh token is inside the rotation window.
	StaleRotatable {
		/// Cached refresh token to exchange.
		refresh_token: TokenSecret,
	},
	/// Cached record is older than the rotation window; fall back to the configured token.
	Expired,
}
impl TokenState {
	/// Classifies `record` at `now_millis` (epoch milliseconds).
	pub fn evaluate(now_millis: i64, record: Option<&CachedToken>) -> Self {
		let Some(record) = record else {
			return Self::NoCache;
		};
		let Some(refresh_token) = record.rotation_token() else {
			return Self::NoCache;
		};
		let passed = record.age_millis(now_millis);
		let lifetime = record.expires_in.saturating_sub(FRESHNESS_MARGIN_SECS);

		if (passed as f64) / 1000.0 < lifetime as f64 {
			return Self::Fresh { access_token: record.access_token.clone() };
		}
		if passed < ROTATION_WINDOW_MILLIS {
			return Self::StaleRotatable { refresh_token: refresh_token.clone() };
		}

		Self::Expired
	}

	/// Refresh token to exchange, or `None` when the cached access token can be served.
	pub fn refresh_token<'a>(&'a self, configured: &'a TokenSecret) -> Option<&'a TokenSecret> {
		match self {
			Self::Fresh { .. } => None,
			Self::StaleRotatable { refresh_token } => Some(refresh_token),
			Self::NoCache | Self::Expired => Some(configured),
		}
	}

	/// Returns `true` when no exchange is needed.
	pub fn is_fresh(&self) -> bool {
		matches!(self, Self::Fresh { .. })
	}

	/// Stable label suitable for span or log fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::NoCache => "no_cache",
			Self::Fresh { .. } => "fresh",
			Self::StaleRotatable { .. } => "stale_rotatable",
			Self::Expired => "expired",
		}
	}
}
impl Display for TokenState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const NOW: i64 = 1_760_000_000_000;

	fn record(age_millis: i64, expires_in: i64) -> CachedToken {
		CachedToken::new("cached-access", Some(TokenSecret::new("cached-refresh")), expires_in)
			.stamped(NOW - age_millis)
	}

	#[test]
	fn missing_record_is_no_cache() {
		assert_eq!(TokenState::evaluate(NOW, None), TokenState::NoCache);
	}

	#[test]
	fn record_without_refresh_token_is_no_cache() {
		let record = CachedToken::new("cached-access", None, 3600).stamped(NOW);

		assert_eq!(TokenState::evaluate(NOW, Some(&record)), TokenState::NoCache);
	}

	#[test]
	fn young_record_is_fresh() {
		let state = TokenState::evaluate(NOW, Some(&record(60_000, 3600)));

		assert_eq!(state, TokenState::Fresh { access_token: TokenSecret::new("cached-access") });
		assert!(state.is_fresh());
		assert_eq!(state.refresh_token(&TokenSecret::new("configured")), None);
	}

	#[test]
	fn freshness_margin_boundary_is_exclusive() {
		// 3600 - 600 = 3000 seconds of usable lifetime.
		let just_inside = TokenState::evaluate(NOW, Some(&record(2_999_999, 3600)));
		let at_boundary = TokenState::evaluate(NOW, Some(&record(3_000_000, 3600)));

		assert!(just_inside.is_fresh());
		assert!(!at_boundary.is_fresh());
	}

	#[test]
	fn stale_record_rotates_cached_refresh_token() {
		let state = TokenState::evaluate(NOW, Some(&record(3_600_000, 3600)));
		let configured = TokenSecret::new("configured");

		assert_eq!(state.as_str(), "stale_rotatable");
		assert_eq!(state.refresh_token(&configured).map(TokenSecret::expose), Some("cached-refresh"));
	}

	#[test]
	fn rotation_window_boundary_is_exclusive() {
		let inside = TokenState::evaluate(NOW, Some(&record(ROTATION_WINDOW_MILLIS - 1, 3600)));
		let outside = TokenState::evaluate(NOW, Some(&record(ROTATION_WINDOW_MILLIS, 3600)));

		assert_eq!(inside.as_str(), "stale_rotatable");
		assert_eq!(outside, TokenState::Expired);
	}

	#[test]
	fn expired_record_uses_configured_refresh_token() {
		let state = TokenState::evaluate(NOW, Some(&record(ROTATION_WINDOW_MILLIS * 2, 3600)));
		let configured = TokenSecret::new("configured");

		assert_eq!(state.refresh_token(&configured).map(TokenSecret::expose), Some("configured"));
	}

	#[test]
	fn short_lifetime_is_never_fresh() {
		// expires_in below the margin leaves a negative usable lifetime.
		let state = TokenState::evaluate(NOW, Some(&record(0, 300)));

		assert_eq!(state.as_str(), "stale_rotatable");
	}

	#[test]
	fn future_save_time_counts_as_fresh() {
		let state = TokenState::evaluate(NOW, Some(&record(-5_000, 3600)));

		assert!(state.is_fresh());
	}
}

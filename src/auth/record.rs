//! Cached token record persisted under the `token_data` key.

// crates.io
use serde::{Deserializer, de::Error as _};
// self
use crate::{_prelude::*, auth::secret::TokenSecret};

/// Token record persisted after a successful on-behalf-of exchange.
///
/// The JSON field names (`access_token`, `refresh_token`, `expires_in`, `save_time`) are the
/// stored schema; renaming them orphans every cached record already written.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Provider-declared lifetime of the access token, in seconds.
	#[serde(default, deserialize_with = "deserialize_expires_in")]
	pub expires_in: i64,
	/// Epoch milliseconds at which the record was written to the cache.
	#[serde(default, rename = "save_time")]
	pub saved_at_millis: i64,
}
impl CachedToken {
	/// Creates an unsaved record from the fields of a token endpoint response.
	pub fn new(
		access_token: impl Into<TokenSecret>,
		refresh_token: Option<TokenSecret>,
		expires_in: i64,
	) -> Self {
		Self { access_token: access_token.into(), refresh_token, expires_in, saved_at_millis: 0 }
	}

	/// Stamps the write timestamp; only the cache layer calls this, right before persisting.
	pub fn stamped(mut self, now_millis: i64) -> Self {
		self.saved_at_millis = now_millis;

		self
	}

	/// Refresh token usable for rotation, ignoring absent or empty values.
	pub fn rotation_token(&self) -> Option<&TokenSecret> {
		self.refresh_token.as_ref().filter(|secret| !secret.is_empty())
	}

	/// Milliseconds elapsed between the write timestamp and `now_millis`.
	pub fn age_millis(&self, now_millis: i64) -> i64 {
		now_millis.saturating_sub(self.saved_at_millis)
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_in", &self.expires_in)
			.field("saved_at_millis", &self.saved_at_millis)
			.finish()
	}
}

/// Lifetime in seconds, sent either as a JSON number or as a numeric string.
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientSeconds {
	Number(i64),
	Text(String),
}

/// Reads an optional `expires_in` that may be a number, a numeric string, or `null`.
pub(crate) fn deserialize_lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<LenientSeconds>::deserialize(deserializer)? {
		None => Ok(None),
		Some(LenientSeconds::Number(seconds)) => Ok(Some(seconds)),
		Some(LenientSeconds::Text(raw)) => raw
			.trim()
			.parse()
			.map(Some)
			.map_err(|e| D::Error::custom(format!("expires_in `{raw}` is not an integer: {e}"))),
	}
}

fn deserialize_expires_in<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
	D: Deserializer<'de>,
{
	deserialize_lenient_seconds(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn stored_schema_uses_legacy_field_names() {
		let record =
			CachedToken::new("access", Some(TokenSecret::new("refresh")), 3599).stamped(42);
		let json = serde_json::to_value(&record).expect("Cached token should serialize.");

		assert_eq!(
			json,
			serde_json::json!({
				"access_token": "access",
				"refresh_token": "refresh",
				"expires_in": 3599,
				"save_time": 42,
			})
		);
	}

	#[test]
	fn missing_optional_fields_default() {
		let record: CachedToken = serde_json::from_str("{\"access_token\":\"a\"}")
			.expect("Minimal record should deserialize.");

		assert_eq!(record.refresh_token, None);
		assert_eq!(record.expires_in, 0);
		assert_eq!(record.saved_at_millis, 0);
	}

	#[test]
	fn expires_in_accepts_numeric_strings() {
		let record: CachedToken =
			serde_json::from_str("{\"access_token\":\"a\",\"expires_in\":\"3599\"}")
				.expect("String lifetimes should deserialize.");

		assert_eq!(record.expires_in, 3599);

		let record: CachedToken =
			serde_json::from_str("{\"access_token\":\"a\",\"expires_in\":null}")
				.expect("Null lifetimes should deserialize.");

		assert_eq!(record.expires_in, 0);
		assert!(
			serde_json::from_str::<CachedToken>("{\"access_token\":\"a\",\"expires_in\":\"soon\"}")
				.is_err()
		);
	}

	#[test]
	fn empty_refresh_token_is_not_rotatable() {
		let record = CachedToken::new("a", Some(TokenSecret::new("")), 3600);

		assert!(record.rotation_token().is_none());
	}

	#[test]
	fn debug_redacts_secrets() {
		let record = CachedToken::new("a-secret", Some(TokenSecret::new("r-secret")), 10);
		let rendered = format!("{record:?}");

		assert!(!rendered.contains("a-secret"));
		assert!(!rendered.contains("r-secret"));
	}
}

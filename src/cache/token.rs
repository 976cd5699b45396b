//! Reads and writes the single cached token record.

// self
use crate::{
	_prelude::*,
	auth::CachedToken,
	cache::TOKEN_DATA_KEY,
	obs,
	store::{KvStore, StoreError},
};

/// Token cache backed by a [`KvStore`].
#[derive(Clone)]
pub struct TokenCacheStore {
	store: Arc<dyn KvStore>,
}
impl TokenCacheStore {
	/// Wraps the provided store handle.
	pub fn new(store: Arc<dyn KvStore>) -> Self {
		Self { store }
	}

	/// Loads the cached record.
	///
	/// Backend failures and malformed JSON are logged and reported as `None`.
	pub async fn load(&self) -> Option<CachedToken> {
		let raw = match self.store.get(TOKEN_DATA_KEY).await {
			Ok(raw) => raw?,
			Err(e) => {
				obs::cache_fallback(TOKEN_DATA_KEY, &e);

				return None;
			},
		};

		match decode(&raw) {
			Ok(record) => Some(record),
			Err(e) => {
				obs::cache_fallback(TOKEN_DATA_KEY, &e);

				None
			},
		}
	}

	/// Stamps `record` with `now_millis` and overwrites whatever is stored.
	pub async fn save(&self, record: CachedToken, now_millis: i64) -> Result<CachedToken, StoreError> {
		let record = record.stamped(now_millis);
		let payload = serde_json::to_string(&record).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize cached token: {e}"),
		})?;

		self.store.put(TOKEN_DATA_KEY, payload).await?;

		Ok(record)
	}
}
impl Debug for TokenCacheStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenCacheStore(..)")
	}
}

fn decode(raw: &str) -> Result<CachedToken, StoreError> {
	let de = &mut serde_json::Deserializer::from_str(raw);

	serde_path_to_error::deserialize(de).map_err(|e| StoreError::Serialization {
		message: format!("Failed to parse cached token at `{}`: {}", e.path(), e.inner()),
	})
}

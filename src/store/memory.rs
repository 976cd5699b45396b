//! Thread-safe in-memory [`KvStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{KvStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, String>>>;

/// Thread-safe storage backend that keeps values in-process for tests and demos.
///
/// Every successful [`put`](KvStore::put) bumps a write counter so callers can assert that a
/// code path did (or did not) write to the cache.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	map: StoreMap,
	writes: Arc<Mutex<u64>>,
}
impl MemoryStore {
	/// Returns a snapshot of the value stored under `key`.
	pub fn peek(&self, key: &str) -> Option<String> {
		self.map.read().get(key).cloned()
	}

	/// Seeds a value without counting it as a write.
	pub fn seed(&self, key: impl Into<String>, value: impl Into<String>) {
		self.map.write().insert(key.into(), value.into());
	}

	/// Number of [`put`](KvStore::put) calls served so far.
	pub fn write_count(&self) -> u64 {
		*self.writes.lock()
	}

	fn put_now(map: StoreMap, writes: Arc<Mutex<u64>>, key: String, value: String) {
		map.write().insert(key, value);

		*writes.lock() += 1;
	}
}
impl KvStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let map = self.map.clone();

		Box::pin(async move { Ok(map.read().get(key).cloned()) })
	}

	fn put<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		let map = self.map.clone();
		let writes = self.writes.clone();
		let key = key.to_owned();

		Box::pin(async move {
			Self::put_now(map, writes, key, value);

			Ok::<_, StoreError>(())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn put_then_get_round_trip() {
		let store = MemoryStore::default();

		assert_eq!(store.get("token_data").await.expect("Memory get should succeed."), None);

		store.put("token_data", "{}".into()).await.expect("Memory put should succeed.");

		assert_eq!(
			store.get("token_data").await.expect("Memory get should succeed."),
			Some("{}".into())
		);
		assert_eq!(store.write_count(), 1);
	}

	#[tokio::test]
	async fn seeding_does_not_count_as_write() {
		let store = MemoryStore::default();

		store.seed("skip_token", "{\"/a\":\"x\"}");

		assert_eq!(store.peek("skip_token").as_deref(), Some("{\"/a\":\"x\"}"));
		assert_eq!(store.write_count(), 0);
	}
}

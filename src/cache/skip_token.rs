//! Per-path cache of pagination continuation tokens.
//!
//! All paths share one JSON object stored under [`SKIP_TOKEN_KEY`]. Every update rewrites the
//! whole document, so two concurrent writers for different paths can drop each other's entry;
//! the only cost is a redundant pagination walk.

// self
use crate::{
	_prelude::*,
	cache::SKIP_TOKEN_KEY,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{KvStore, StoreError},
};

/// Lower-cased path → comma-joined skip tokens.
pub type SkipTokenMap = BTreeMap<String, String>;

const SEPARATOR: &str = ",";

/// Skip-token cache backed by a [`KvStore`].
#[derive(Clone)]
pub struct SkipTokenCache {
	store: Arc<dyn KvStore>,
}
impl SkipTokenCache {
	/// Wraps the provided store handle.
	pub fn new(store: Arc<dyn KvStore>) -> Self {
		Self { store }
	}

	/// Returns the tokens cached for `path`, replacing them with `tokens_to_save` when provided
	/// and different.
	///
	/// The returned list is always the state *before* any write. Comparison happens on the
	/// comma-joined form, so `["a,b"]` and `["a", "b"]` are considered equal.
	pub async fn get_and_maybe_save<S>(
		&self,
		path: &str,
		tokens_to_save: Option<&[S]>,
	) -> Result<Vec<String>>
	where
		S: AsRef<str>,
	{
		const KIND: FlowKind = FlowKind::SkipToken;

		let span = FlowSpan::new(KIND, "get_and_maybe_save");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<Vec<String>> = span
			.instrument(async move {
				let path = path.to_lowercase();
				let mut map = self.load().await;
				let current_joined = map.get(&path).map(String::as_str).unwrap_or_default();
				let current = split_tokens(current_joined);

				if let Some(tokens) = tokens_to_save {
					let joined = join_tokens(tokens);

					if joined != current_joined {
						map.insert(path, joined);
						self.persist(&map).await.map_err(Error::from)?;
					}
				}

				Ok(current)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Returns the tokens cached for `path` without writing.
	pub async fn get(&self, path: &str) -> Result<Vec<String>> {
		self.get_and_maybe_save::<&str>(path, None).await
	}

	async fn load(&self) -> SkipTokenMap {
		let raw = match self.store.get(SKIP_TOKEN_KEY).await {
			Ok(Some(raw)) => raw,
			Ok(None) => return SkipTokenMap::new(),
			Err(e) => {
				obs::cache_fallback(SKIP_TOKEN_KEY, &e);

				return SkipTokenMap::new();
			},
		};

		serde_json::from_str(&raw).unwrap_or_else(|e| {
			obs::cache_fallback(SKIP_TOKEN_KEY, &e);

			SkipTokenMap::new()
		})
	}

	async fn persist(&self, map: &SkipTokenMap) -> Result<(), StoreError> {
		let payload = serde_json::to_string(map).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize skip tokens: {e}"),
		})?;

		self.store.put(SKIP_TOKEN_KEY, payload).await
	}
}
impl Debug for SkipTokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("SkipTokenCache(..)")
	}
}

fn split_tokens(joined: &str) -> Vec<String> {
	if joined.is_empty() {
		return Vec::new();
	}

	joined.split(SEPARATOR).map(str::to_owned).collect()
}

fn join_tokens<S>(tokens: &[S]) -> String
where
	S: AsRef<str>,
{
	tokens.iter().map(|token| token.as_ref()).collect::<Vec<&str>>().join(SEPARATOR)
}

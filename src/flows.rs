//! Broker entry points: token acquisition and authenticated storage API calls.

pub mod acquire;
pub mod request;

pub use acquire::*;
pub use request::*;

// self
use crate::{
	_prelude::*,
	cache::{SkipTokenCache, TokenCacheStore},
	config::OAuthConfig,
	http::ReqwestHttpClient,
	store::KvStore,
};

/// Acquires on-behalf-of access tokens and decorates storage API requests with them.
///
/// The broker owns the configuration, the HTTP client shared by token exchanges and storage
/// calls, and an optional key/value store. Without a store every acquisition performs a fresh
/// exchange and nothing is persisted.
#[derive(Clone)]
pub struct Broker {
	/// OAuth client configuration used for every exchange.
	pub config: OAuthConfig,
	/// HTTP client wrapper used for token exchanges and storage API calls.
	pub http_client: ReqwestHttpClient,
	/// Optional cache backend for the token record and skip tokens.
	pub store: Option<Arc<dyn KvStore>>,
	/// Shared counters for acquisition outcomes.
	pub acquire_metrics: Arc<AcquireMetrics>,
}
impl Broker {
	/// Creates a broker with a default reqwest client and no cache.
	pub fn new(config: OAuthConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}

	/// Creates a broker that reuses the caller-provided HTTP client.
	pub fn with_http_client(config: OAuthConfig, http_client: ReqwestHttpClient) -> Self {
		Self { config, http_client, store: None, acquire_metrics: Default::default() }
	}

	/// Attaches the key/value store used for the token cache and skip tokens.
	pub fn with_store(mut self, store: Arc<dyn KvStore>) -> Self {
		self.store = Some(store);

		self
	}

	/// Token cache view over the attached store, if any.
	pub fn token_cache(&self) -> Option<TokenCacheStore> {
		self.store.clone().map(TokenCacheStore::new)
	}

	/// Skip-token cache view over the attached store, if any.
	pub fn skip_token_cache(&self) -> Option<SkipTokenCache> {
		self.store.clone().map(SkipTokenCache::new)
	}
}
impl Debug for Broker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("config", &self.config)
			.field("store_set", &self.store.is_some())
			.finish()
	}
}

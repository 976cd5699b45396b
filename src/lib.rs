//! On-behalf-of OAuth 2.0 broker for storage APIs: exchange refresh tokens lazily, cache the
//! result in any key/value store, and decorate outbound requests with bearer credentials.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod cache;
pub mod config;
pub mod digest;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod store;
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::OAuthConfig,
		flows::Broker,
		http::ReqwestHttpClient,
		store::{KvStore, MemoryStore},
	};

	/// Client identifier used by test fixtures.
	pub const TEST_CLIENT_ID: &str = "client-obo";
	/// Client secret used by test fixtures.
	pub const TEST_CLIENT_SECRET: &str = "secret-obo";
	/// Refresh token configured in test fixtures.
	pub const TEST_REFRESH_TOKEN: &str = "refresh-configured";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a configuration whose token endpoint base is `oauth_base` and whose storage API
	/// lives at `api_host`.
	pub fn test_config(oauth_base: &str, api_host: &str) -> OAuthConfig {
		OAuthConfig::builder()
			.client_id(TEST_CLIENT_ID)
			.client_secret(TEST_CLIENT_SECRET)
			.oauth_url(Url::parse(oauth_base).expect("Failed to parse test OAuth base URL."))
			.api_host(Url::parse(api_host).expect("Failed to parse test API host URL."))
			.refresh_token(TEST_REFRESH_TOKEN)
			.build()
			.expect("Failed to build test OAuth configuration.")
	}

	/// Constructs a [`Broker`] backed by an in-memory store and the insecure reqwest transport
	/// used across integration tests.
	pub fn build_test_broker(config: OAuthConfig) -> (Broker, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn KvStore> = store_backend.clone();
		let broker =
			Broker::with_http_client(config, test_reqwest_http_client()).with_store(store);

		(broker, store_backend)
	}

	/// Constructs a [`Broker`] without any cache handle.
	pub fn build_uncached_test_broker(config: OAuthConfig) -> Broker {
		Broker::with_http_client(config, test_reqwest_http_client())
	}

	/// Returns the current wall-clock time in epoch milliseconds.
	pub fn now_millis() -> i64 {
		crate::auth::epoch_millis(OffsetDateTime::now_utc())
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};

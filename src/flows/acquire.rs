//! Lazy access token acquisition with cache reuse and refresh-token rotation.
//!
//! [`Broker::acquire_access_token`] loads the cached record (when a store is attached),
//! classifies it with [`TokenState::evaluate`], and either serves the cached access token or
//! performs one on-behalf-of exchange. Exchanges that return a refresh token overwrite the
//! cached record; there is no locking, so concurrent callers may each exchange and the last
//! write wins.

mod metrics;

pub use metrics::AcquireMetrics;

// self
use crate::{
	_prelude::*,
	auth::{self, TokenSecret, TokenState},
	cache::TOKEN_DATA_KEY,
	flows::Broker,
	oauth::OnBehalfOfFacade,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl Broker {
	/// Returns a usable access token, exchanging the configured or cached refresh token when the
	/// cached access token is missing or stale.
	pub async fn acquire_access_token(&self) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::Acquire;

		let span = FlowSpan::new(KIND, "acquire_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.acquire_metrics.record_attempt();

		let result = span.instrument(self.acquire_inner()).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => {
				self.acquire_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn acquire_inner(&self) -> Result<TokenSecret> {
		let cache = self.token_cache();
		let cached = match &cache {
			Some(cache) => cache.load().await,
			None => None,
		};
		let state = TokenState::evaluate(
			auth::epoch_millis(OffsetDateTime::now_utc()),
			cached.as_ref(),
		);

		obs::acquisition_state(&state);

		let refresh_token = match &state {
			TokenState::Fresh { access_token } => {
				self.acquire_metrics.record_cache_hit();

				return Ok(access_token.clone());
			},
			TokenState::StaleRotatable { refresh_token } => refresh_token,
			TokenState::NoCache | TokenState::Expired => &self.config.refresh_token,
		};
		let facade = OnBehalfOfFacade::from_config(&self.config, self.http_client.clone())?;
		let record = facade.exchange(refresh_token).await?;

		self.acquire_metrics.record_exchange();

		let access_token = record.access_token.clone();

		match cache {
			Some(cache) if record.rotation_token().is_some() => {
				let now = auth::epoch_millis(OffsetDateTime::now_utc());

				if let Err(e) = cache.save(record, now).await {
					obs::cache_write_failed(TOKEN_DATA_KEY, &e);
				}
			},
			_ => {},
		}

		Ok(access_token)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{build_test_broker, now_millis, test_config},
		auth::CachedToken,
	};

	#[tokio::test]
	async fn fresh_record_is_served_without_exchange() {
		// The token endpoint is unroutable; any exchange attempt would fail.
		let config = test_config("https://127.0.0.1:9/oauth2/", "https://127.0.0.1:9");
		let (broker, backend) = build_test_broker(config);
		let record =
			CachedToken::new("cached-access", Some(TokenSecret::new("cached-refresh")), 3600)
				.stamped(now_millis());

		backend.seed(
			TOKEN_DATA_KEY,
			serde_json::to_string(&record).expect("Record fixture should serialize."),
		);

		let token = broker.acquire_access_token().await.expect("Fresh record should be served.");

		assert_eq!(token.expose(), "cached-access");
		assert_eq!(broker.acquire_metrics.attempts(), 1);
		assert_eq!(broker.acquire_metrics.cache_hits(), 1);
		assert_eq!(broker.acquire_metrics.exchanges(), 0);
		assert_eq!(backend.write_count(), 0);
	}

	#[tokio::test]
	async fn exchange_failure_is_counted() {
		let config = test_config("https://127.0.0.1:9/oauth2/", "https://127.0.0.1:9");
		let (broker, _) = build_test_broker(config);
		let err = broker.acquire_access_token().await.expect_err("Unreachable endpoint must fail.");

		assert!(err.is_exchange_failure());
		assert_eq!(broker.acquire_metrics.failures(), 1);
	}
}

//! Demonstrates acquiring an on-behalf-of token, reusing it from an in-memory cache, and
//! sending a batch request against a mocked storage API.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::{Value, json};
use url::Url;
// self
use obo_broker::{
	config::OAuthConfig,
	digest,
	flows::Broker,
	http::ReqwestHttpClient,
	reqwest::Client,
	store::{KvStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/common/oauth2/v2.0/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"token_type\":\"Bearer\",\"expires_in\":3599}",
			);
		})
		.await;
	let batch_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1.0/$batch").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"responses\":[{\"id\":\"1\",\"status\":200}]}");
		})
		.await;
	let config = OAuthConfig::builder()
		.client_id("demo-client")
		.client_secret("demo-secret")
		.oauth_url(Url::parse(&server.url("/common/oauth2/v2.0/"))?)
		.api_host(Url::parse(&server.base_url())?)
		.refresh_token("demo-initial-refresh")
		.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let store: Arc<dyn KvStore> = Arc::new(MemoryStore::default());
	let broker = Broker::with_http_client(config, http_client).with_store(store);
	let first = broker.acquire_access_token().await?;
	let second = broker.acquire_access_token().await?;

	println!("Access token reused from cache: {}.", first == second);

	let reply: Value = broker
		.fetch_batch(&json!({ "requests": [{ "id": "1", "method": "GET", "url": "/me/drive" }] }))
		.await?;

	println!("Batch reply: {reply}.");
	println!("Fingerprint of the reply: {}.", digest::sha256_hex(&reply.to_string()));

	token_mock.assert_calls_async(1).await;
	batch_mock.assert_async().await;

	Ok(())
}

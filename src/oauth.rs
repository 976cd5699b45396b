//! On-behalf-of exchange facade over the `oauth2` crate.
//!
//! The facade posts `grant_type=refresh_token` with `requested_token_use=on_behalf_of` and the
//! client credentials in the form body, then maps both the token response and every failure
//! mode into broker types.

pub use oauth2;

// crates.io
use oauth2::{
	AccessToken, AuthType, Client, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RefreshToken, RequestTokenError, Scope, StandardRevocableToken,
	TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicErrorResponseType, BasicRequestTokenError,
		BasicRevocationErrorResponse, BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
use serde::{
	Deserializer,
	de::{IntoDeserializer, value::StringDeserializer},
};
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, TokenSecret, record},
	config::OAuthConfig,
	error::{ConfigError, ExchangeError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
};

/// Extra form parameter that turns a refresh grant into an on-behalf-of exchange.
pub const REQUESTED_TOKEN_USE: (&str, &str) = ("requested_token_use", "on_behalf_of");

type OnBehalfOfClient = Client<
	BasicErrorResponse,
	OnBehalfOfTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Token endpoint reply.
///
/// Only `access_token` is required. `token_type` defaults to `bearer`, and `expires_in` may be a
/// number or a numeric string.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OnBehalfOfTokenResponse {
	access_token: AccessToken,
	#[serde(default = "default_token_type", deserialize_with = "deserialize_token_type")]
	token_type: BasicTokenType,
	#[serde(
		default,
		skip_serializing_if = "Option::is_none",
		deserialize_with = "record::deserialize_lenient_seconds"
	)]
	expires_in: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<RefreshToken>,
}
impl TokenResponse for OnBehalfOfTokenResponse {
	type TokenType = BasicTokenType;

	fn access_token(&self) -> &AccessToken {
		&self.access_token
	}

	fn token_type(&self) -> &BasicTokenType {
		&self.token_type
	}

	fn expires_in(&self) -> Option<std::time::Duration> {
		self.expires_in
			.and_then(|seconds| u64::try_from(seconds).ok())
			.map(std::time::Duration::from_secs)
	}

	fn refresh_token(&self) -> Option<&RefreshToken> {
		self.refresh_token.as_ref()
	}

	fn scopes(&self) -> Option<&Vec<Scope>> {
		None
	}
}

fn default_token_type() -> BasicTokenType {
	BasicTokenType::Bearer
}

fn deserialize_token_type<'de, D>(deserializer: D) -> Result<BasicTokenType, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<String>::deserialize(deserializer)? {
		Some(raw) => {
			let de: StringDeserializer<D::Error> = raw.to_lowercase().into_deserializer();

			BasicTokenType::deserialize(de)
		},
		None => Ok(default_token_type()),
	}
}

pub(crate) struct OnBehalfOfFacade {
	oauth_client: OnBehalfOfClient,
	http_client: ReqwestHttpClient,
}
impl OnBehalfOfFacade {
	pub(crate) fn from_config(config: &OAuthConfig, http_client: ReqwestHttpClient) -> Result<Self> {
		let token_url = TokenUrl::new(config.token_endpoint())
			.map_err(|source| ConfigError::InvalidTokenEndpoint { source })?;
		let oauth_client: OnBehalfOfClient = Client::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.expose().to_owned()))
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self { oauth_client, http_client })
	}

	/// Exchanges `refresh_token` for a new token record (not yet stamped).
	pub(crate) async fn exchange(&self, refresh_token: &TokenSecret) -> Result<CachedToken> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
		let (param, value) = REQUESTED_TOKEN_USE;
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.add_extra_param(param, value)
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		Ok(map_token_response(response))
	}
}

fn map_token_response(response: OnBehalfOfTokenResponse) -> CachedToken {
	let expires_in = response
		.expires_in()
		.map(|lifetime| i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX))
		.unwrap_or_default();
	let refresh_token = response.refresh_token().map(|token| TokenSecret::new(token.secret()));

	CachedToken::new(response.access_token().secret().as_str(), refresh_token, expires_in)
}

fn map_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, status),
		RequestTokenError::Request(error) => map_transport_error(error, status),
		RequestTokenError::Parse(source, _body) =>
			ExchangeError::TokenResponseParse { source, status }.into(),
		RequestTokenError::Other(message) => ExchangeError::Unexpected { message, status }.into(),
	}
}

fn map_server_response_error(response: BasicErrorResponse, status: Option<u16>) -> Error {
	let message = match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	};

	match response.error() {
		BasicErrorResponseType::InvalidGrant => Error::InvalidGrant { reason: message },
		BasicErrorResponseType::InvalidClient | BasicErrorResponseType::UnauthorizedClient =>
			Error::InvalidClient { reason: message },
		_ => ExchangeError::Rejected { message, status }.into(),
	}
}

fn map_transport_error(err: HttpClientError<ReqwestError>, status: Option<u16>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) =>
			if inner.is_builder() {
				ConfigError::from(*inner).into()
			} else {
				TransportError::from(*inner).into()
			},
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => ExchangeError::Unexpected { message, status }.into(),
		_ => ExchangeError::Unexpected {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status,
		}
		.into(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config(oauth_url: &str) -> OAuthConfig {
		OAuthConfig::builder()
			.client_id("client-id")
			.client_secret("secret")
			.oauth_url(Url::parse(oauth_url).expect("Failed to parse OAuth URL fixture."))
			.api_host(Url::parse("https://graph.example.com").expect("Failed to parse API host."))
			.refresh_token("refresh")
			.build()
			.expect("Failed to build config fixture.")
	}

	#[test]
	fn builds_facade_from_config() {
		let result = OnBehalfOfFacade::from_config(
			&config("https://login.example.com/common/oauth2/v2.0/"),
			ReqwestHttpClient::default(),
		);

		assert!(result.is_ok());
	}

	#[test]
	fn token_response_maps_into_unstamped_record() {
		let response: OnBehalfOfTokenResponse = serde_json::from_str(
			"{\"access_token\":\"a\",\"token_type\":\"Bearer\",\"expires_in\":3599,\"refresh_token\":\"r\"}",
		)
		.expect("Token response fixture should parse.");
		let record = map_token_response(response);

		assert_eq!(record.access_token.expose(), "a");
		assert_eq!(record.refresh_token.as_ref().map(TokenSecret::expose), Some("r"));
		assert_eq!(record.expires_in, 3599);
		assert_eq!(record.saved_at_millis, 0);
	}

	#[test]
	fn token_response_tolerates_missing_type_and_string_lifetime() {
		let response: OnBehalfOfTokenResponse =
			serde_json::from_str("{\"access_token\":\"a\",\"expires_in\":\"3599\"}")
				.expect("Minimal token response should parse.");

		assert_eq!(response.token_type(), &BasicTokenType::Bearer);

		let record = map_token_response(response);

		assert_eq!(record.expires_in, 3599);
		assert_eq!(record.refresh_token, None);

		let response: OnBehalfOfTokenResponse =
			serde_json::from_str("{\"access_token\":\"a\",\"token_type\":\"Bearer\"}")
				.expect("Capitalized token types should parse.");

		assert_eq!(response.token_type(), &BasicTokenType::Bearer);
		assert_eq!(map_token_response(response).expires_in, 0);
		assert!(serde_json::from_str::<OnBehalfOfTokenResponse>("{\"expires_in\":1}").is_err());
	}

	#[test]
	fn server_errors_are_classified() {
		let invalid_grant: BasicErrorResponse = serde_json::from_str(
			"{\"error\":\"invalid_grant\",\"error_description\":\"AADSTS70000: expired\"}",
		)
		.expect("Error response fixture should parse.");
		let other: BasicErrorResponse = serde_json::from_str("{\"error\":\"invalid_request\"}")
			.expect("Error response fixture should parse.");

		match map_server_response_error(invalid_grant, Some(400)) {
			Error::InvalidGrant { reason } => assert!(reason.contains("AADSTS70000")),
			other => panic!("Unexpected error variant: {other:?}."),
		}
		match map_server_response_error(other, Some(400)) {
			Error::Exchange(err) => assert_eq!(err.status(), Some(400)),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}

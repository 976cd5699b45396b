//! Bearer-decorated requests against the storage API.

// crates.io
use reqwest::{
	Method, Response,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, RequestError},
	flows::Broker,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Outbound storage API request that the broker decorates with a bearer token.
#[derive(Clone, Debug)]
pub struct AuthRequest {
	/// HTTP method; defaults to `GET`.
	pub method: Method,
	/// Absolute request URI.
	pub uri: String,
	/// Caller headers; these win over the injected `Authorization` header.
	pub headers: Vec<(String, String)>,
	/// Raw request body.
	pub body: Option<Vec<u8>>,
}
impl AuthRequest {
	/// Creates a `GET` request for `uri`.
	pub fn new(uri: impl Into<String>) -> Self {
		Self { method: Method::GET, uri: uri.into(), headers: Vec::new(), body: None }
	}

	/// Creates a `POST` request for `uri`.
	pub fn post(uri: impl Into<String>) -> Self {
		Self::new(uri).method(Method::POST)
	}

	/// Overrides the HTTP method.
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;

		self
	}

	/// Appends a caller header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Sets the request body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}
}

impl Broker {
	/// Acquires an access token and sends `request` with `Authorization: Bearer <token>`.
	///
	/// The response is returned whatever its status; a `401` is not retried.
	pub async fn fetch_with_auth(&self, request: AuthRequest) -> Result<Response> {
		const KIND: FlowKind = FlowKind::Fetch;

		let span = FlowSpan::new(KIND, "fetch_with_auth");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.send_with_auth(request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Posts `payload` as JSON to the storage API batch endpoint and decodes the JSON reply.
	///
	/// The response status is not inspected; a non-JSON error body surfaces as
	/// [`RequestError::Decode`].
	pub async fn fetch_batch<P, R>(&self, payload: &P) -> Result<R>
	where
		P: ?Sized + Serialize,
		R: DeserializeOwned,
	{
		const KIND: FlowKind = FlowKind::Batch;

		let span = FlowSpan::new(KIND, "fetch_batch");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<R> = span
			.instrument(async move {
				let body = serde_json::to_vec(payload).map_err(RequestError::Encode)?;
				let url = self.config.batch_endpoint();
				let request = AuthRequest::post(url.clone())
					.header(CONTENT_TYPE.as_str(), "application/json")
					.body(body);
				let response = self.send_with_auth(request).await?;
				let status = response.status().as_u16();
				let bytes = response
					.bytes()
					.await
					.map_err(|source| RequestError::Send { url: url.clone(), source })?;

				decode_json(&bytes)
					.map_err(|source| Error::from(RequestError::Decode { url, status, source }))
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn send_with_auth(&self, request: AuthRequest) -> Result<Response> {
		let AuthRequest { method, uri, headers, body } = request;
		let url = Url::parse(&uri)
			.map_err(|source| ConfigError::InvalidRequestUri { uri: uri.clone(), source })?;
		let token = self.acquire_access_token().await?;
		let headers = merge_headers(&token, &headers)?;
		let mut builder = self.http_client.request(method, url).headers(headers);

		if let Some(body) = body {
			builder = builder.body(body);
		}

		builder.send().await.map_err(|source| RequestError::Send { url: uri, source }.into())
	}
}

fn merge_headers(token: &TokenSecret, headers: &[(String, String)]) -> Result<HeaderMap> {
	let mut merged = HeaderMap::with_capacity(headers.len() + 1);

	for (name, value) in headers {
		let invalid = || ConfigError::InvalidHeader { name: name.clone() };
		let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

		merged.append(header_name, header_value);
	}

	if !merged.contains_key(AUTHORIZATION) {
		let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
			.map_err(|_| ConfigError::InvalidHeader { name: AUTHORIZATION.as_str().to_owned() })?;

		bearer.set_sensitive(true);
		merged.insert(AUTHORIZATION, bearer);
	}

	Ok(merged)
}

fn decode_json<R>(bytes: &[u8]) -> Result<R, serde_path_to_error::Error<serde_json::Error>>
where
	R: DeserializeOwned,
{
	let de = &mut serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(de)
}

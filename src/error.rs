//! Broker-level error types shared across flows, caches, and stores.

// self
use crate::_prelude::*;

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint answered, but not with a usable token.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
	/// Transport failure (DNS, TCP, TLS) while calling the token endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Authenticated request against the storage API failed.
	#[error(transparent)]
	Request(#[from] RequestError),

	/// Provider rejected the refresh token.
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or broker-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or broker-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Returns `true` when the failure happened while exchanging a refresh token.
	pub fn is_exchange_failure(&self) -> bool {
		matches!(
			self,
			Self::Exchange(_) | Self::Transport(_) | Self::InvalidGrant { .. } | Self::InvalidClient { .. }
		)
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Token endpoint URL derived from the configuration is invalid.
	#[error("Token endpoint URL is invalid.")]
	InvalidTokenEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Request URI cannot be parsed.
	#[error("Request URI `{uri}` is invalid.")]
	InvalidRequestUri {
		/// Offending URI.
		uri: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request header name or value is invalid.
	#[error("Request header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// OAuth client configuration failed validation.
	#[error(transparent)]
	OAuth(#[from] crate::config::OAuthConfigError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Token endpoint failures that are not transport errors.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// Provider returned an OAuth error that does not map to a dedicated variant.
	#[error("Token endpoint rejected the exchange: {message}.")]
	Rejected {
		/// Provider- or broker-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint returned a response the OAuth client could not classify.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	Unexpected {
		/// Broker-supplied message.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl ExchangeError {
	/// HTTP status reported by the token endpoint, when known.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. }
			| Self::TokenResponseParse { status, .. }
			| Self::Unexpected { status, .. } => *status,
		}
	}
}

/// Transport-level failures (network, IO) while calling the token endpoint.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failures of authenticated calls against the storage API.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// Request could not be sent or its body could not be read.
	#[error("Storage API request to {url} failed.")]
	Send {
		/// Target URL.
		url: String,
		/// Underlying reqwest failure.
		#[source]
		source: ReqwestError,
	},
	/// Request payload could not be serialized.
	#[error("Storage API request payload could not be serialized.")]
	Encode(#[source] serde_json::Error),
	/// Response body is not the expected JSON document.
	#[error("Storage API response from {url} could not be decoded.")]
	Decode {
		/// Target URL.
		url: String,
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
}

//! OAuth client configuration consumed by the broker.
//!
//! The configuration is immutable once built. Build it explicitly with
//! [`OAuthConfig::builder`] or load it from `OBO_*` environment variables with
//! [`OAuthConfig::from_env`]; both paths run the same validation.

// std
use std::env;
// self
use crate::{_prelude::*, auth::TokenSecret};

/// Environment variable holding the OAuth client identifier.
pub const ENV_CLIENT_ID: &str = "OBO_CLIENT_ID";
/// Environment variable holding the OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "OBO_CLIENT_SECRET";
/// Environment variable holding the token endpoint base URL.
pub const ENV_OAUTH_URL: &str = "OBO_OAUTH_URL";
/// Environment variable holding the storage API host.
pub const ENV_API_HOST: &str = "OBO_API_HOST";
/// Environment variable holding the long-lived initial refresh token.
pub const ENV_REFRESH_TOKEN: &str = "OBO_REFRESH_TOKEN";

/// Errors raised while constructing or validating an [`OAuthConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum OAuthConfigError {
	/// A required field was never set.
	#[error("Missing {field}.")]
	MissingField {
		/// Field label.
		field: &'static str,
	},
	/// A required field was set to an empty string.
	#[error("The {field} must not be empty.")]
	EmptyField {
		/// Field label.
		field: &'static str,
	},
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Environment variable is missing or not valid unicode.
	#[error("Environment variable {name} is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// Environment variable holds something that is not a URL.
	#[error("Environment variable {name} is not a valid URL: {message}.")]
	InvalidEnvUrl {
		/// Variable name.
		name: &'static str,
		/// Parser message.
		message: String,
	},
}

/// Process-wide OAuth client configuration for on-behalf-of exchanges.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthConfig {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// OAuth 2.0 client secret.
	pub client_secret: TokenSecret,
	/// Base URL of the identity provider; the token endpoint is `<oauth_url>token`.
	pub oauth_url: Url,
	/// Storage API host, e.g. `https://graph.microsoft.com`.
	pub api_host: Url,
	/// Long-lived refresh token used when no rotated token is cached.
	pub refresh_token: TokenSecret,
}
impl OAuthConfig {
	/// Creates an empty builder.
	pub fn builder() -> OAuthConfigBuilder {
		OAuthConfigBuilder::default()
	}

	/// Loads the configuration from the `OBO_*` environment variables.
	pub fn from_env() -> Result<Self, OAuthConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Loads the configuration through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, OAuthConfigError>
	where
		F: Fn(&'static str) -> Option<String>,
	{
		let var = |name| lookup(name).ok_or(OAuthConfigError::MissingEnv { name });
		let url = |name| {
			var(name).and_then(|raw| {
				Url::parse(&raw).map_err(|e| OAuthConfigError::InvalidEnvUrl {
					name,
					message: e.to_string(),
				})
			})
		};

		Self::builder()
			.client_id(var(ENV_CLIENT_ID)?)
			.client_secret(var(ENV_CLIENT_SECRET)?)
			.oauth_url(url(ENV_OAUTH_URL)?)
			.api_host(url(ENV_API_HOST)?)
			.refresh_token(var(ENV_REFRESH_TOKEN)?)
			.build()
	}

	/// Token endpoint URL, built by appending `token` to the configured base.
	///
	/// The base is expected to end with `/` (e.g. `https://login.microsoftonline.com/common/oauth2/v2.0/`).
	pub fn token_endpoint(&self) -> String {
		format!("{}token", self.oauth_url.as_str())
	}

	/// Batch endpoint URL of the storage API.
	pub fn batch_endpoint(&self) -> String {
		format!("{}/v1.0/$batch", self.api_host.as_str().trim_end_matches('/'))
	}

	fn validate(&self) -> Result<(), OAuthConfigError> {
		validate_non_empty("client id", &self.client_id)?;
		validate_non_empty("client secret", self.client_secret.expose())?;
		validate_non_empty("refresh token", self.refresh_token.expose())?;
		validate_endpoint("OAuth URL", &self.oauth_url)?;
		validate_endpoint("API host", &self.api_host)?;

		Ok(())
	}
}
impl Debug for OAuthConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.field("oauth_url", &self.oauth_url.as_str())
			.field("api_host", &self.api_host.as_str())
			.field("refresh_token", &self.refresh_token)
			.finish()
	}
}

/// Builder for [`OAuthConfig`] values.
#[derive(Debug, Default)]
pub struct OAuthConfigBuilder {
	client_id: Option<String>,
	client_secret: Option<TokenSecret>,
	oauth_url: Option<Url>,
	api_host: Option<Url>,
	refresh_token: Option<TokenSecret>,
}
impl OAuthConfigBuilder {
	/// Sets the client identifier.
	pub fn client_id(mut self, value: impl Into<String>) -> Self {
		self.client_id = Some(value.into());

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, value: impl Into<TokenSecret>) -> Self {
		self.client_secret = Some(value.into());

		self
	}

	/// Sets the token endpoint base URL.
	pub fn oauth_url(mut self, url: Url) -> Self {
		self.oauth_url = Some(url);

		self
	}

	/// Sets the storage API host.
	pub fn api_host(mut self, url: Url) -> Self {
		self.api_host = Some(url);

		self
	}

	/// Sets the initial refresh token.
	pub fn refresh_token(mut self, value: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(value.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<OAuthConfig, OAuthConfigError> {
		let config = OAuthConfig {
			client_id: self.client_id.ok_or(OAuthConfigError::MissingField { field: "client id" })?,
			client_secret: self
				.client_secret
				.ok_or(OAuthConfigError::MissingField { field: "client secret" })?,
			oauth_url: self.oauth_url.ok_or(OAuthConfigError::MissingField { field: "OAuth URL" })?,
			api_host: self.api_host.ok_or(OAuthConfigError::MissingField { field: "API host" })?,
			refresh_token: self
				.refresh_token
				.ok_or(OAuthConfigError::MissingField { field: "refresh token" })?,
		};

		config.validate()?;

		Ok(config)
	}
}

fn validate_non_empty(field: &'static str, value: &str) -> Result<(), OAuthConfigError> {
	if value.trim().is_empty() { Err(OAuthConfigError::EmptyField { field }) } else { Ok(()) }
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), OAuthConfigError> {
	if url.scheme() != "https" {
		Err(OAuthConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse config fixture URL.")
	}

	fn builder() -> OAuthConfigBuilder {
		OAuthConfig::builder()
			.client_id("client")
			.client_secret("secret")
			.oauth_url(url("https://login.microsoftonline.com/common/oauth2/v2.0/"))
			.api_host(url("https://graph.microsoft.com"))
			.refresh_token("refresh")
	}

	#[test]
	fn derives_token_and_batch_endpoints() {
		let config = builder().build().expect("Config fixture should build.");

		assert_eq!(
			config.token_endpoint(),
			"https://login.microsoftonline.com/common/oauth2/v2.0/token"
		);
		assert_eq!(config.batch_endpoint(), "https://graph.microsoft.com/v1.0/$batch");
	}

	#[test]
	fn rejects_insecure_and_missing_values() {
		let err = builder()
			.api_host(url("http://graph.microsoft.com"))
			.build()
			.expect_err("Plain HTTP API hosts must be rejected.");

		assert!(matches!(err, OAuthConfigError::InsecureEndpoint { endpoint: "API host", .. }));

		let err = OAuthConfig::builder()
			.client_id("client")
			.build()
			.expect_err("Incomplete builders must be rejected.");

		assert_eq!(err, OAuthConfigError::MissingField { field: "client secret" });

		let err =
			builder().refresh_token("  ").build().expect_err("Blank refresh tokens must be rejected.");

		assert_eq!(err, OAuthConfigError::EmptyField { field: "refresh token" });
	}

	#[test]
	fn loads_from_lookup() {
		let vars: HashMap<&str, &str> = HashMap::from([
			(ENV_CLIENT_ID, "env-client"),
			(ENV_CLIENT_SECRET, "env-secret"),
			(ENV_OAUTH_URL, "https://login.example.com/oauth2/"),
			(ENV_API_HOST, "https://api.example.com"),
			(ENV_REFRESH_TOKEN, "env-refresh"),
		]);
		let config = OAuthConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
			.expect("Complete environment should load.");

		assert_eq!(config.client_id, "env-client");
		assert_eq!(config.token_endpoint(), "https://login.example.com/oauth2/token");

		let err = OAuthConfig::from_lookup(|name| {
			(name != ENV_REFRESH_TOKEN).then(|| vars[name].to_string())
		})
		.expect_err("Missing variables must be reported.");

		assert_eq!(err, OAuthConfigError::MissingEnv { name: ENV_REFRESH_TOKEN });
	}

	#[test]
	fn debug_redacts_secrets() {
		let rendered = format!("{:?}", builder().build().expect("Config fixture should build."));

		assert!(!rendered.contains("\"secret\""));
		assert!(!rendered.contains("\"refresh\""));
	}
}

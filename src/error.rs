//! Crate-level error types shared across drivers, providers, stores, and services.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
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
	/// Network or HTTP-status failure; never retried automatically.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Malformed response or provider-reported failure.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	/// The user refused the authorization request at the provider.
	#[error("User canceled the authorization: {reason}.")]
	UserCanceled {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// No valid, non-expired access token is available for a signed call.
	#[error("Access token is missing or no longer valid.")]
	InvalidToken,
	/// No pending request token exists for the OAuth 1.0 exchange.
	#[error("Request token is required to fetch an access token.")]
	MissingRequestToken,
	/// The HTTP method cannot be used for provider requests.
	#[error("Request method `{method}` is not supported.")]
	UnsupportedMethod {
		/// Method string that failed to parse.
		method: String,
	},
	/// An expired token could not be refreshed.
	#[error("Failed to refresh the expired access token.")]
	TokenRefreshFailed {
		/// Failure raised while refreshing.
		#[source]
		source: Box<Error>,
	},
}
impl Error {
	/// Wraps a refresh failure unless it already carries the refresh context.
	pub fn refresh_failed(source: Error) -> Self {
		match source {
			Self::TokenRefreshFailed { .. } => source,
			other => Self::TokenRefreshFailed { source: Box::new(other) },
		}
	}

	/// Returns `true` when the provider reported a user refusal.
	pub fn is_user_canceled(&self) -> bool {
		matches!(self, Self::UserCanceled { .. })
	}
}

/// Configuration and validation failures.
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
	/// A request URL could not be parsed.
	#[error("Request URL `{url}` is invalid.")]
	InvalidUrl {
		/// URL text that failed to parse.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A relative API endpoint was used without an API base URL.
	#[error("Endpoint `{endpoint}` is relative but the descriptor has no API base URL.")]
	MissingApiBase {
		/// Relative endpoint supplied by the caller.
		endpoint: String,
	},
	/// The flow requires a callback URL and none was configured.
	#[error("A callback URL is required for the {flow} flow.")]
	MissingCallbackUrl {
		/// Flow label.
		flow: &'static str,
	},
	/// The stored token carries no refresh token.
	#[error("Stored access token is missing a refresh token.")]
	MissingRefreshToken,
	/// The signature method must only travel over HTTPS.
	#[error("Signature method {method} requires HTTPS, but the {endpoint} endpoint is {url}.")]
	InsecureSignatureMethod {
		/// Signature method identifier.
		method: String,
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A keyed digest rejected its key.
	#[error("Signing key is unusable: {message}.")]
	SigningKey {
		/// Digest-supplied description.
		message: String,
	},
	/// The driver and descriptor disagree on the protocol version.
	#[error("Descriptor `{descriptor}` targets {protocol}, which this driver does not speak.")]
	ProtocolMismatch {
		/// Provider identifier string.
		descriptor: String,
		/// Protocol label declared by the descriptor.
		protocol: &'static str,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::DescriptorError),
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Token builder validation failed.
	#[error("Unable to build OAuth token.")]
	TokenBuild(#[from] crate::auth::OAuthTokenBuilderError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeouts, HTTP status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Provider answered with a non-2xx status.
	#[error("Request failed with status {status}: {body}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Response body (lossy UTF-8).
		body: String,
	},
	/// Connect or read timeout elapsed.
	#[error("Request timed out while calling the provider.")]
	Timeout,
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
	/// Transport reported a failure without a structured error.
	#[error("HTTP client error occurred while calling the provider: {message}.")]
	Other {
		/// Transport-supplied description.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// HTTP status code for status failures.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}

/// Malformed responses and provider-reported protocol failures.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Response content type could not be determined.
	#[error("Unable to determine the response content type.")]
	UnknownContentType,
	/// Provider reported an error payload.
	#[error("Provider returned an error: {error}{}.", description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
	Provider {
		/// Provider `error` field.
		error: String,
		/// Provider `error_description` (or equivalent) field.
		description: Option<String>,
	},
	/// Response body could not be decoded as the detected content type.
	#[error("Malformed {content_type} response: {message}.")]
	Malformed {
		/// Content type label.
		content_type: &'static str,
		/// Decoder message.
		message: String,
	},
	/// Response decoded, but a required field is absent.
	#[error("Response is missing the `{field}` field.")]
	MissingField {
		/// Field name.
		field: &'static str,
	},
	/// Token endpoint payload did not match the expected shape.
	#[error("Token response could not be decoded.")]
	TokenResponse {
		/// Structured decoding failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Callback token or anti-forgery state does not match the persisted value.
	#[error("Callback {parameter} does not match the pending authorization.")]
	StateMismatch {
		/// Parameter that failed the comparison.
		parameter: &'static str,
	},
}

//! Transport primitives shared by both protocol drivers.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. Drivers describe a call
//! as an [`ApiRequest`], lower it into an `oauth2::HttpRequest` (method-aware placement of
//! parameters in the query string or a form body), and execute it through a short-lived
//! [`AsyncHttpClient`] handle configured with the layered [`TransportOptions`].

// std
use std::{ops::Deref, time::Duration as StdDuration};
// crates.io
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	http::{
		Method,
		header::{CONTENT_TYPE, HeaderName, HeaderValue, USER_AGENT},
	},
};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	protocol::{self, Params},
};

const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);
const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Abstraction over HTTP transports capable of executing provider requests.
///
/// Implementations must be `Send + Sync + 'static` so drivers can share them, and the handles
/// they return must own whatever state the request needs so their futures stay `Send`.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle configured for a single request.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle honoring the per-request parts of `options` (the read timeout).
	fn handle(&self, options: &TransportOptions) -> Self::Handle;

	/// Classifies a transport-specific failure.
	fn map_transport_error(&self, error: Self::TransportError) -> TransportError {
		TransportError::network(error)
	}
}

/// Converts an [`HttpClientError`] into the crate taxonomy.
pub fn map_http_client_error<C>(transport: &C, error: HttpClientError<C::TransportError>) -> Error
where
	C: ?Sized + HttpTransport,
{
	match error {
		HttpClientError::Reqwest(inner) => transport.map_transport_error(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransportError::Other { message }.into(),
		_ => TransportError::Other { message: "unrecognized transport failure".into() }.into(),
	}
}

/// Transport settings layered `defaults ← protocol-specific ← caller overrides`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportOptions {
	/// Total request (read) timeout.
	pub timeout: Option<StdDuration>,
	/// Connection establishment timeout, applied when the transport is built.
	pub connect_timeout: Option<StdDuration>,
	/// `User-Agent` header value.
	pub user_agent: Option<String>,
	/// Extra headers sent with every request.
	pub headers: BTreeMap<String, String>,
}
impl TransportOptions {
	/// Crate defaults: 30 second connect and read timeouts plus the crate user agent.
	pub fn defaults() -> Self {
		Self {
			timeout: Some(DEFAULT_TIMEOUT),
			connect_timeout: Some(DEFAULT_TIMEOUT),
			user_agent: Some(DEFAULT_USER_AGENT.into()),
			headers: BTreeMap::new(),
		}
	}

	/// Sets the read timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Sets the connect timeout.
	pub fn with_connect_timeout(mut self, timeout: StdDuration) -> Self {
		self.connect_timeout = Some(timeout);

		self
	}

	/// Sets the user agent.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Adds a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Overlays `other` on top of `self`; every field `other` sets wins.
	pub fn merge(mut self, other: &TransportOptions) -> Self {
		if other.timeout.is_some() {
			self.timeout = other.timeout;
		}
		if other.connect_timeout.is_some() {
			self.connect_timeout = other.connect_timeout;
		}
		if other.user_agent.is_some() {
			self.user_agent.clone_from(&other.user_agent);
		}

		self.headers.extend(other.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

		self
	}

	/// Builds the effective options for one request.
	pub fn layered(protocol: &TransportOptions, caller: &TransportOptions) -> Self {
		Self::defaults().merge(protocol).merge(caller)
	}
}

/// HTTP methods accepted for provider calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
	/// `HEAD`
	Head,
}
impl HttpMethod {
	/// Uppercase method name as used on the wire and in OAuth 1.0 base strings.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
			Self::Head => "HEAD",
		}
	}

	/// Returns `true` when parameters travel in a form body instead of the query string.
	pub fn carries_body(self) -> bool {
		matches!(self, Self::Post | Self::Put)
	}

	fn to_http(self) -> Method {
		match self {
			Self::Get => Method::GET,
			Self::Post => Method::POST,
			Self::Put => Method::PUT,
			Self::Delete => Method::DELETE,
			Self::Head => Method::HEAD,
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for HttpMethod {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_ascii_uppercase().as_str() {
			"GET" => Ok(Self::Get),
			"POST" => Ok(Self::Post),
			"PUT" => Ok(Self::Put),
			"DELETE" => Ok(Self::Delete),
			"HEAD" => Ok(Self::Head),
			_ => Err(Error::UnsupportedMethod { method: s.to_owned() }),
		}
	}
}

/// Provider request before it is lowered onto the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: HttpMethod,
	/// Target URL; any query it carries is merged with `params`.
	pub url: Url,
	/// Request parameters.
	pub params: Params,
	/// Request headers.
	pub headers: BTreeMap<String, String>,
}
impl ApiRequest {
	/// Creates a request without headers.
	pub fn new(method: HttpMethod, url: Url, params: Params) -> Self {
		Self { method, url, params, headers: BTreeMap::new() }
	}

	/// Adds a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Lowers the request into an `oauth2` HTTP request.
	///
	/// GET/HEAD/DELETE parameters are merged into the URL query; POST/PUT parameters become an
	/// `application/x-www-form-urlencoded` body. Request headers override option headers.
	pub fn into_http_request(self, options: &TransportOptions) -> Result<HttpRequest, ConfigError> {
		let Self { method, mut url, params, headers } = self;
		let body = if method.carries_body() {
			protocol::build_query_string(&params).into_bytes()
		} else {
			let mut query = protocol::parse_query_string(url.query().unwrap_or_default());

			query.merge(params);
			url.set_query(None);

			if !query.is_empty() {
				url.set_query(Some(&protocol::build_query_string(&query)));
			}

			Vec::new()
		};
		let mut builder =
			oauth2::http::Request::builder().method(method.to_http()).uri(url.as_str());

		if let Some(user_agent) = options.user_agent.as_deref() {
			builder = builder.header(USER_AGENT, user_agent);
		}
		if method.carries_body() {
			builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE);
		}

		for (name, value) in options.headers.iter().chain(headers.iter()) {
			let name = HeaderName::from_bytes(name.as_bytes()).map_err(oauth2::http::Error::from)?;
			let value = HeaderValue::from_str(value).map_err(oauth2::http::Error::from)?;

			if let Some(map) = builder.headers_mut() {
				map.insert(name, value);
			}
		}

		builder.body(body).map_err(ConfigError::from)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The connect timeout is fixed when the client is built; the read timeout is applied to each
/// request from the layered [`TransportOptions`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client honoring the connect timeout and user agent in `options`.
	pub fn with_options(options: &TransportOptions) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none());

		if let Some(timeout) = options.connect_timeout {
			builder = builder.connect_timeout(timeout);
		}
		if let Some(user_agent) = options.user_agent.as_deref() {
			builder = builder.user_agent(user_agent);
		}

		Ok(Self(builder.build()?))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	type Handle = ReqwestHandle;
	type TransportError = ReqwestError;

	fn handle(&self, options: &TransportOptions) -> Self::Handle {
		ReqwestHandle { client: self.0.clone(), timeout: options.timeout }
	}

	fn map_transport_error(&self, error: Self::TransportError) -> TransportError {
		error.into()
	}
}

/// Per-request handle returned by [`ReqwestHttpClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHandle {
	client: ReqwestClient,
	timeout: Option<StdDuration>,
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			let mut request: reqwest::Request = request.try_into().map_err(Box::new)?;

			if let Some(timeout) = self.timeout {
				*request.timeout_mut() = Some(timeout);
			}

			let response = self.client.execute(request).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}


#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("URL fixture should parse.")
	}

	#[test]
	fn methods_parse_case_insensitively() {
		assert_eq!("get".parse::<HttpMethod>().expect("GET should parse."), HttpMethod::Get);
		assert_eq!(
			"Delete".parse::<HttpMethod>().expect("DELETE should parse."),
			HttpMethod::Delete
		);
		assert!(matches!(
			"PATCH".parse::<HttpMethod>(),
			Err(Error::UnsupportedMethod { method }) if method == "PATCH"
		));
	}

	#[test]
	fn options_layer_caller_over_protocol_over_defaults() {
		let protocol = TransportOptions::default().with_header("Accept", "application/json");
		let caller = TransportOptions::default()
			.with_timeout(StdDuration::from_secs(5))
			.with_header("Accept", "text/xml");
		let options = TransportOptions::layered(&protocol, &caller);

		assert_eq!(options.timeout, Some(StdDuration::from_secs(5)));
		assert_eq!(options.connect_timeout, Some(DEFAULT_TIMEOUT));
		assert_eq!(options.headers.get("Accept").map(String::as_str), Some("text/xml"));
		assert!(options.user_agent.as_deref().is_some_and(|ua| ua.starts_with("oauth-relay/")));
	}

	#[test]
	fn get_parameters_merge_into_the_query() {
		let request = ApiRequest::new(
			HttpMethod::Get,
			url("https://api.example.com/search?q=rust&page=1"),
			Params::new().with("page", "2").with("access_token", "tok"),
		)
		.into_http_request(&TransportOptions::defaults())
		.expect("GET request should lower.");

		assert_eq!(*request.method(), Method::GET);
		assert_eq!(
			request.uri().to_string(),
			"https://api.example.com/search?access_token=tok&page=2&q=rust"
		);
		assert!(request.body().is_empty());
	}

	#[test]
	fn post_parameters_become_a_form_body() {
		let request = ApiRequest::new(
			HttpMethod::Post,
			url("https://api.example.com/statuses"),
			Params::new().with("status", "hello world"),
		)
		.with_header("X-Trace", "abc")
		.into_http_request(&TransportOptions::defaults())
		.expect("POST request should lower.");

		assert_eq!(request.body().as_slice(), b"status=hello%20world");
		assert_eq!(
			request.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
			Some(FORM_CONTENT_TYPE)
		);
		assert_eq!(request.headers().get("x-trace").and_then(|v| v.to_str().ok()), Some("abc"));
		assert!(request.headers().contains_key(USER_AGENT));
	}

	#[test]
	fn invalid_header_names_are_config_errors() {
		let err = ApiRequest::new(HttpMethod::Get, url("https://api.example.com"), Params::new())
			.with_header("bad header", "x")
			.into_http_request(&TransportOptions::defaults())
			.expect_err("Header names with spaces should be rejected.");

		assert!(matches!(err, ConfigError::HttpRequest(_)));
	}
}

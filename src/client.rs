//! Version-agnostic client plumbing: the [`OAuthClient`] contract, request execution, response
//! decoding, and durable token persistence shared by both protocol drivers.

pub mod response;

pub use response::*;

// crates.io
use oauth2::{AsyncHttpClient, http::header::CONTENT_TYPE};
// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, OAuthToken},
	error::{ConfigError, TransportError},
	http::{self, ApiRequest, HttpMethod, HttpTransport, TransportOptions},
	obs::{self, FlowKind},
	protocol::Params,
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
	store::{SessionStore, StoreKey, StoreSlot},
};

/// Boxed future returned by [`OAuthClient`] operations.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Contract shared by the OAuth 1.0 and OAuth 2.0 drivers.
///
/// Callers use [`api`](OAuthClient::api); drivers supply token restoration and the
/// protocol-specific token attachment in [`api_internal`](OAuthClient::api_internal).
pub trait OAuthClient
where
	Self: Send + Sync,
{
	/// Provider descriptor the client was configured with.
	fn descriptor(&self) -> &ProviderDescriptor;

	/// Returns the current access token, restoring it from the store on first use.
	///
	/// OAuth 2.0 clients refresh an expired token before returning it.
	fn access_token(&self) -> ClientFuture<'_, Option<OAuthToken>>;

	/// Replaces (or clears) the access token and writes it through to the store.
	fn set_access_token(&self, token: Option<OAuthToken>) -> ClientFuture<'_, ()>;

	/// Attaches `token` to `request` and executes it.
	fn api_internal(&self, request: ApiRequest, token: OAuthToken) -> ClientFuture<'_, Value>;

	/// Calls a provider API endpoint on the user's behalf.
	///
	/// `endpoint` is either absolute or relative to the descriptor's API base. Fails with
	/// [`Error::InvalidToken`] when no valid, unexpired token is available.
	fn api<'a>(
		&'a self,
		endpoint: &'a str,
		method: HttpMethod,
		params: Params,
	) -> ClientFuture<'a, Value> {
		Box::pin(async move {
			let descriptor = self.descriptor();

			obs::observe(FlowKind::Api, "client.api", &descriptor.id, async move {
				let token = self
					.access_token()
					.await?
					.filter(OAuthToken::is_valid)
					.ok_or(Error::InvalidToken)?;
				let url = descriptor.resolve_api_url(endpoint)?;

				self.api_internal(ApiRequest::new(method, url, params), token).await
			})
			.await
		})
	}
}

enum CachedToken {
	Unloaded,
	Loaded(Option<OAuthToken>),
}

/// State and transport shared by both protocol drivers.
pub struct ClientCore<C>
where
	C: ?Sized + HttpTransport,
{
	/// Provider endpoints, scope, and quirks.
	pub descriptor: ProviderDescriptor,
	/// Consumer key/secret (OAuth 1.0) or client id/secret (OAuth 2.0).
	pub credentials: ClientCredentials,
	/// Callback URL the provider redirects back to.
	pub callback_url: Option<Url>,
	/// Durable store holding tokens and transient flow state.
	pub store: Arc<dyn SessionStore>,
	/// Provider-specific request customization.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// HTTP transport executing every request.
	pub transport: Arc<C>,
	/// Options contributed by the protocol driver.
	pub protocol_options: TransportOptions,
	/// Caller overrides, applied last.
	pub transport_options: TransportOptions,
	token: Mutex<CachedToken>,
}
impl<C> ClientCore<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a core with the default strategy and no callback URL.
	pub fn new(
		descriptor: ProviderDescriptor,
		credentials: ClientCredentials,
		store: Arc<dyn SessionStore>,
		transport: Arc<C>,
	) -> Self {
		Self {
			descriptor,
			credentials,
			callback_url: None,
			store,
			strategy: Arc::new(DefaultProviderStrategy),
			transport,
			protocol_options: TransportOptions::default(),
			transport_options: TransportOptions::default(),
			token: Mutex::new(CachedToken::Unloaded),
		}
	}

	/// Store key for `slot`, unique to this client id and authorize URL.
	pub fn key(&self, slot: StoreSlot) -> StoreKey {
		StoreKey::for_client(
			self.descriptor.protocol,
			&self.credentials.client_id,
			&self.descriptor.endpoints.authorization,
			slot,
		)
	}

	/// Returns the configured callback URL or fails for `flow`.
	pub fn callback_url(&self, flow: &'static str) -> Result<&Url, ConfigError> {
		self.callback_url.as_ref().ok_or(ConfigError::MissingCallbackUrl { flow })
	}

	/// Effective transport options for the next request.
	pub fn options(&self) -> TransportOptions {
		TransportOptions::layered(&self.protocol_options, &self.transport_options)
	}

	/// Returns the durable token as stored, without any refresh.
	pub async fn stored_token(&self) -> Result<Option<OAuthToken>> {
		let cached = match &*self.token.lock() {
			CachedToken::Loaded(token) => Some(token.clone()),
			CachedToken::Unloaded => None,
		};

		if let Some(token) = cached {
			return Ok(token);
		}

		let token = self.store.load::<OAuthToken>(&self.key(StoreSlot::Token)).await?;

		*self.token.lock() = CachedToken::Loaded(token.clone());

		Ok(token)
	}

	/// Replaces the durable token; `None` removes it from the store.
	pub async fn store_token(&self, token: Option<OAuthToken>) -> Result<()> {
		let key = self.key(StoreSlot::Token);

		match &token {
			Some(token) => self.store.save(&key, token).await?,
			None => {
				self.store.remove(&key).await?;
			},
		}

		*self.token.lock() = CachedToken::Loaded(token);

		Ok(())
	}

	/// Sends `params` to `url` and decodes the response.
	pub async fn send_request(&self, method: HttpMethod, url: Url, params: Params) -> Result<Value> {
		self.execute(ApiRequest::new(method, url, params)).await
	}

	/// Executes a fully prepared request.
	///
	/// Non-2xx responses fail with [`TransportError::Status`] carrying the raw body.
	pub async fn execute(&self, request: ApiRequest) -> Result<Value> {
		let options = self.options();
		let http_request = request.into_http_request(&options)?;
		let handle = self.transport.handle(&options);
		let response = handle
			.call(http_request)
			.await
			.map_err(|e| http::map_http_client_error(&*self.transport, e))?;
		let status = response.status();

		if !status.is_success() {
			return Err(TransportError::Status {
				status: status.as_u16(),
				body: String::from_utf8_lossy(response.body()).into_owned(),
			}
			.into());
		}

		let hint = response.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok());

		response::process_response(response.body(), hint)
	}
}
impl<C> Debug for ClientCore<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCore")
			.field("descriptor", &self.descriptor.id)
			.field("protocol", &self.descriptor.protocol)
			.field("credentials", &self.credentials)
			.field("callback_url", &self.callback_url.as_ref().map(Url::as_str))
			.finish()
	}
}

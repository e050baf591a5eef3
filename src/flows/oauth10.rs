//! OAuth 1.0/1.0a three-legged flow.
//!
//! 1. [`OAuth10Client::fetch_request_token`] obtains temporary credentials and parks them in
//!    the store's `request_token` slot, discarding any previous access token.
//! 2. [`OAuth10Client::build_auth_url`] points the user at the provider with that token.
//! 3. [`OAuth10Client::fetch_access_token`] consumes the parked token (whatever the outcome),
//!    exchanges it plus the verifier, and persists the durable access token.
//!
//! Every request, including later API calls, is signed by [`RequestSigner`] using the injected
//! [`SignatureMethod`].

pub mod signature;
pub mod signing;

pub use signature::*;
pub use signing::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, OAuthToken},
	client::{ClientCore, ClientFuture, OAuthClient},
	error::{ConfigError, ProtocolError},
	flows,
	http::{ApiRequest, HttpTransport, TransportOptions},
	obs::{self, FlowKind},
	protocol::{self, Params},
	provider::{DescriptorError, ProtocolVersion, ProviderDescriptor, ProviderStrategy},
	store::{SessionStore, StoreSlot},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Callback value announcing an out-of-band verifier (OAuth 1.0a without a callback URL).
const OUT_OF_BAND: &str = "oob";

/// OAuth 1.0/1.0a driver.
pub struct OAuth10Client<C>
where
	C: ?Sized + HttpTransport,
{
	core: ClientCore<C>,
	signature_method: Arc<dyn SignatureMethod>,
}
impl<C> OAuth10Client<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a driver over a caller-provided transport.
	///
	/// Fails when the descriptor targets OAuth 2.0.
	pub fn with_transport(
		descriptor: ProviderDescriptor,
		credentials: ClientCredentials,
		store: Arc<dyn SessionStore>,
		transport: impl Into<Arc<C>>,
	) -> Result<Self> {
		flows::ensure_protocol(&descriptor, ProtocolVersion::is_oauth1)?;

		Ok(Self {
			core: ClientCore::new(descriptor, credentials, store, transport.into()),
			signature_method: Arc::new(HmacSha1),
		})
	}

	/// Sets the callback URL the provider redirects to after the user decides.
	pub fn with_callback_url(mut self, url: Url) -> Self {
		self.core.callback_url = Some(url);

		self
	}

	/// Overrides the provider strategy (cancellation markers).
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.core.strategy = strategy;

		self
	}

	/// Overrides transport options; fields set here win over every other layer.
	pub fn with_transport_options(mut self, options: TransportOptions) -> Self {
		self.core.transport_options = options;

		self
	}

	/// Swaps the signature method.
	///
	/// Methods that expose the key (`PLAINTEXT`) are rejected unless every configured endpoint
	/// uses HTTPS.
	pub fn with_signature_method(
		mut self,
		method: Arc<dyn SignatureMethod>,
	) -> Result<Self, ConfigError> {
		if method.requires_secure_transport() {
			let endpoints = &self.core.descriptor.endpoints;
			let checks = [
				("request_token", endpoints.request_token.as_ref()),
				("authorization", Some(&endpoints.authorization)),
				("access_token", Some(&endpoints.access_token)),
				("api_base", endpoints.api_base.as_ref()),
			];

			for (endpoint, url) in checks {
				if let Some(url) = url.filter(|url| url.scheme() != "https") {
					return Err(ConfigError::InsecureSignatureMethod {
						method: method.name().to_owned(),
						endpoint,
						url: url.to_string(),
					});
				}
			}
		}

		self.signature_method = method;

		Ok(self)
	}

	/// Shared client state.
	pub fn core(&self) -> &ClientCore<C> {
		&self.core
	}

	/// Active signature method.
	pub fn signature_method(&self) -> &dyn SignatureMethod {
		self.signature_method.as_ref()
	}

	/// Signer bound to this client's method and consumer credentials.
	pub fn signer(&self) -> RequestSigner<'_> {
		RequestSigner::new(self.signature_method.as_ref(), &self.core.credentials)
	}

	/// Fetches and parks a request token.
	///
	/// OAuth 1.0a sends the callback URL (or `oob`) as `oauth_callback`. The stored access
	/// token is discarded first since re-authorization invalidates it.
	pub async fn fetch_request_token(&self, extra: Params) -> Result<OAuthToken> {
		let core = &self.core;

		obs::observe(
			FlowKind::RequestToken,
			"oauth10.fetch_request_token",
			&core.descriptor.id,
			async move {
				let descriptor = &core.descriptor;
				let url = descriptor
					.endpoints
					.request_token
					.clone()
					.ok_or(ConfigError::from(DescriptorError::MissingRequestTokenEndpoint))?;
				let mut params = Params::new();

				if descriptor.protocol == ProtocolVersion::OAuth10a {
					let callback =
						core.callback_url.as_ref().map(Url::as_str).unwrap_or(OUT_OF_BAND);

					params.insert("oauth_callback", callback);
				}
				if let Some(scope) = descriptor.scope_param() {
					params.insert("scope", scope);
				}

				params.merge(extra);

				core.store_token(None).await?;

				let request =
					ApiRequest::new(descriptor.quirks.request_token_method, url, params);
				let payload = core.execute(self.signer().sign(request, None)?).await?;
				let token = OAuthToken::from_response(
					descriptor.protocol,
					payload,
					OffsetDateTime::now_utc(),
				)?;

				core.store.save(&core.key(StoreSlot::RequestToken), &token).await?;

				Ok(token)
			},
		)
		.await
	}

	/// Authorize URL carrying `token`; OAuth 1.0 (not 1.0a) also carries the callback here.
	pub fn auth_url_for(&self, token: &OAuthToken, extra: Params) -> Url {
		let descriptor = &self.core.descriptor;
		let mut url = descriptor.endpoints.authorization.clone();
		let mut params = protocol::parse_query_string(url.query().unwrap_or_default());

		params.insert("oauth_token", token.token().expose());

		if let Some(callback) =
			self.core.callback_url.as_ref().filter(|_| descriptor.protocol == ProtocolVersion::OAuth10)
		{
			params.insert("oauth_callback", callback.as_str());
		}

		params.merge(extra);
		url.set_query(Some(&protocol::build_query_string(&params)));

		url
	}

	/// Authorize URL for the parked request token.
	///
	/// Fails with [`Error::MissingRequestToken`] when no request token is pending.
	pub async fn build_auth_url(&self, extra: Params) -> Result<Url> {
		let token = self
			.core
			.store
			.load::<OAuthToken>(&self.core.key(StoreSlot::RequestToken))
			.await?
			.ok_or(Error::MissingRequestToken)?;

		Ok(self.auth_url_for(&token, extra))
	}

	/// Exchanges the parked request token for an access token.
	///
	/// `callback` holds the provider's redirect parameters. A cancellation marker yields
	/// [`Error::UserCanceled`]. The request token is removed before the exchange, so a second
	/// call fails with [`Error::MissingRequestToken`] even if the first one failed.
	pub async fn fetch_access_token(&self, callback: &Params, extra: Params) -> Result<OAuthToken> {
		let core = &self.core;

		obs::observe(
			FlowKind::AccessToken,
			"oauth10.fetch_access_token",
			&core.descriptor.id,
			async move {
				let descriptor = &core.descriptor;
				let key = core.key(StoreSlot::RequestToken);

				if let Some(reason) = core.strategy.cancellation(descriptor.protocol, callback) {
					core.store.remove(&key).await?;

					return Err(Error::UserCanceled { reason });
				}

				let request_token =
					core.store.take::<OAuthToken>(&key).await?.ok_or(Error::MissingRequestToken)?;

				if callback
					.get("oauth_token")
					.is_some_and(|returned| returned != request_token.token().expose())
				{
					return Err(ProtocolError::StateMismatch { parameter: "oauth_token" }.into());
				}

				let mut params = Params::new();

				match callback.get("oauth_verifier") {
					Some(verifier) => params.insert("oauth_verifier", verifier),
					None if descriptor.protocol == ProtocolVersion::OAuth10a =>
						return Err(ProtocolError::MissingField { field: "oauth_verifier" }.into()),
					None => {},
				}

				params.merge(extra);

				let request = ApiRequest::new(
					descriptor.quirks.access_token_method,
					descriptor.endpoints.access_token.clone(),
					params,
				);
				let payload =
					core.execute(self.signer().sign(request, Some(&request_token))?).await?;
				let token = OAuthToken::from_response(
					descriptor.protocol,
					payload,
					OffsetDateTime::now_utc(),
				)?;

				core.store_token(Some(token.clone())).await?;

				Ok(token)
			},
		)
		.await
	}
}
#[cfg(feature = "reqwest")]
impl OAuth10Client<ReqwestHttpClient> {
	/// Creates a driver with a reqwest transport built from the default options.
	pub fn new(
		descriptor: ProviderDescriptor,
		credentials: ClientCredentials,
		store: Arc<dyn SessionStore>,
	) -> Result<Self> {
		let transport = ReqwestHttpClient::with_options(&TransportOptions::defaults())?;

		Self::with_transport(descriptor, credentials, store, transport)
	}
}
impl<C> OAuthClient for OAuth10Client<C>
where
	C: ?Sized + HttpTransport,
{
	fn descriptor(&self) -> &ProviderDescriptor {
		&self.core.descriptor
	}

	fn access_token(&self) -> ClientFuture<'_, Option<OAuthToken>> {
		Box::pin(self.core.stored_token())
	}

	fn set_access_token(&self, token: Option<OAuthToken>) -> ClientFuture<'_, ()> {
		Box::pin(self.core.store_token(token))
	}

	fn api_internal(&self, request: ApiRequest, token: OAuthToken) -> ClientFuture<'_, Value> {
		Box::pin(async move {
			let signed = self.signer().sign(request, Some(&token))?;

			self.core.execute(signed).await
		})
	}
}
impl<C> Debug for OAuth10Client<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth10Client")
			.field("core", &self.core)
			.field("signature_method", &self.signature_method.name())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::ProviderId, http::testing::OfflineTransport, store::MemoryStore};

	fn descriptor(scheme: &str, protocol: ProtocolVersion) -> ProviderDescriptor {
		let url = |path: &str| {
			Url::parse(&format!("{scheme}://legacy.example.com/{path}"))
				.expect("Endpoint fixture should parse.")
		};

		ProviderDescriptor::builder(
			ProviderId::new("legacy").expect("Provider fixture should be valid."),
			protocol,
		)
		.request_token_endpoint(url("oauth/request_token"))
		.authorization_endpoint(url("oauth/authorize?display=popup"))
		.access_token_endpoint(url("oauth/access_token"))
		.build()
		.expect("Descriptor fixture should build.")
	}

	fn client(scheme: &str, protocol: ProtocolVersion) -> OAuth10Client<OfflineTransport> {
		OAuth10Client::<OfflineTransport>::with_transport(
			descriptor(scheme, protocol),
			ClientCredentials::new("ck", "cs"),
			Arc::new(MemoryStore::default()),
			OfflineTransport,
		)
		.expect("OAuth 1 client should build.")
	}

	#[test]
	fn plaintext_requires_https_endpoints() {
		let err = client("http", ProtocolVersion::OAuth10a)
			.with_signature_method(Arc::new(Plaintext))
			.expect_err("PLAINTEXT over HTTP should be rejected.");

		assert!(matches!(
			err,
			ConfigError::InsecureSignatureMethod { endpoint: "request_token", .. }
		));

		let client = client("https", ProtocolVersion::OAuth10a)
			.with_signature_method(Arc::new(Plaintext))
			.expect("PLAINTEXT over HTTPS should be accepted.");

		assert_eq!(client.signature_method().name(), "PLAINTEXT");
	}

	#[test]
	fn oauth2_descriptors_are_rejected() {
		let descriptor = ProviderDescriptor::builder(
			ProviderId::new("modern").expect("Provider fixture should be valid."),
			ProtocolVersion::OAuth20,
		)
		.authorization_endpoint(Url::parse("https://m.example.com/a").expect("URL should parse."))
		.access_token_endpoint(Url::parse("https://m.example.com/t").expect("URL should parse."))
		.build()
		.expect("Descriptor fixture should build.");
		let result = OAuth10Client::<OfflineTransport>::with_transport(
			descriptor,
			ClientCredentials::new("ck", "cs"),
			Arc::new(MemoryStore::default()),
			OfflineTransport,
		);

		assert!(matches!(result, Err(Error::Config(ConfigError::ProtocolMismatch { .. }))));
	}

	#[test]
	fn auth_url_keeps_existing_query_and_adds_callback_for_legacy_revision() {
		let token = OAuthToken::builder("req").build().expect("Token fixture should build.");
		let callback = Url::parse("https://app.example.com/cb").expect("Callback should parse.");
		let legacy = client("https", ProtocolVersion::OAuth10).with_callback_url(callback.clone());
		let url = legacy.auth_url_for(&token, Params::new());
		let query = protocol::parse_query_string(url.query().unwrap_or_default());

		assert_eq!(query.get("oauth_token"), Some("req"));
		assert_eq!(query.get("display"), Some("popup"));
		assert_eq!(query.get("oauth_callback"), Some("https://app.example.com/cb"));

		let revised = client("https", ProtocolVersion::OAuth10a).with_callback_url(callback);
		let url = revised.auth_url_for(&token, Params::new());

		assert!(!url.as_str().contains("oauth_callback"));
	}

	#[tokio::test]
	async fn access_token_exchange_requires_a_pending_request_token() {
		let client = client("https", ProtocolVersion::OAuth10a);
		let callback = Params::new().with("oauth_token", "req").with("oauth_verifier", "v");
		let err = client
			.fetch_access_token(&callback, Params::new())
			.await
			.expect_err("Exchange without request token should fail.");

		assert!(matches!(err, Error::MissingRequestToken));
		assert!(matches!(
			client.build_auth_url(Params::new()).await,
			Err(Error::MissingRequestToken)
		));
	}

	#[tokio::test]
	async fn denied_callback_is_a_cancellation_and_consumes_the_request_token() {
		let client = client("https", ProtocolVersion::OAuth10a);
		let key = client.core().key(StoreSlot::RequestToken);
		let token = OAuthToken::builder("req").token_secret("s").build().expect("Token should build.");

		client.core().store.save(&key, &token).await.expect("Seeding should succeed.");

		let err = client
			.fetch_access_token(&Params::new().with("denied", "req"), Params::new())
			.await
			.expect_err("Denied callback should fail.");

		assert!(err.is_user_canceled());
		assert_eq!(client.core().store.get(&key).await.expect("Get should succeed."), None);
	}

	#[tokio::test]
	async fn mismatched_callback_token_is_rejected_after_consumption() {
		let client = client("https", ProtocolVersion::OAuth10a);
		let key = client.core().key(StoreSlot::RequestToken);
		let token = OAuthToken::builder("req").build().expect("Token should build.");

		client.core().store.save(&key, &token).await.expect("Seeding should succeed.");

		let callback = Params::new().with("oauth_token", "other").with("oauth_verifier", "v");
		let err = client
			.fetch_access_token(&callback, Params::new())
			.await
			.expect_err("Mismatched token should fail.");

		assert!(matches!(
			err,
			Error::Protocol(ProtocolError::StateMismatch { parameter: "oauth_token" })
		));
		assert!(matches!(
			client.fetch_access_token(&callback, Params::new()).await,
			Err(Error::MissingRequestToken)
		));
	}

	#[tokio::test]
	async fn api_calls_without_a_token_are_invalid() {
		let client = client("https", ProtocolVersion::OAuth10a);
		let err = client
			.api("https://legacy.example.com/me", crate::http::HttpMethod::Get, Params::new())
			.await
			.expect_err("API call without token should fail.");

		assert!(matches!(err, Error::InvalidToken));
	}
}

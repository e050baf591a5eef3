//! OAuth 2.0 authorization-code flow with refresh.
//!
//! [`OAuth20Client::build_auth_url`] sends the user to the provider (persisting an
//! anti-forgery `state` unless the descriptor disables it), [`OAuth20Client::fetch_access_token`]
//! exchanges the returned code, and [`OAuthClient::access_token`] transparently runs
//! [`OAuth20Client::refresh_access_token`] whenever the stored token has expired.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, OAuthToken},
	client::{ClientCore, ClientFuture, OAuthClient},
	error::{ConfigError, ProtocolError},
	flows,
	http::{ApiRequest, HttpMethod, HttpTransport, TransportOptions},
	obs::{self, FlowKind},
	protocol::{self, Params},
	provider::{GrantType, ProtocolVersion, ProviderDescriptor, ProviderStrategy},
	store::{SessionStore, StoreSlot},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

const STATE_LEN: usize = 32;
const FLOW: &str = "authorization_code";

/// OAuth 2.0 driver.
pub struct OAuth20Client<C>
where
	C: ?Sized + HttpTransport,
{
	core: ClientCore<C>,
	refresh_metrics: Arc<RefreshMetrics>,
}
impl<C> OAuth20Client<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a driver over a caller-provided transport.
	///
	/// Fails when the descriptor targets OAuth 1.0. Token endpoints are asked for JSON.
	pub fn with_transport(
		descriptor: ProviderDescriptor,
		credentials: ClientCredentials,
		store: Arc<dyn SessionStore>,
		transport: impl Into<Arc<C>>,
	) -> Result<Self> {
		flows::ensure_protocol(&descriptor, |protocol| protocol == ProtocolVersion::OAuth20)?;

		let mut core = ClientCore::new(descriptor, credentials, store, transport.into());

		core.protocol_options = TransportOptions::default().with_header("Accept", "application/json");

		Ok(Self { core, refresh_metrics: Default::default() })
	}

	/// Sets the redirect URI sent as `redirect_uri`.
	pub fn with_callback_url(mut self, url: Url) -> Self {
		self.core.callback_url = Some(url);

		self
	}

	/// Injects a provider strategy (token placement, token-request fields, cancellation).
	pub fn with_strategy(mut self, strategy: Arc<dyn ProviderStrategy>) -> Self {
		self.core.strategy = strategy;

		self
	}

	/// Overrides transport options; fields set here win over every other layer.
	pub fn with_transport_options(mut self, options: TransportOptions) -> Self {
		self.core.transport_options = options;

		self
	}

	/// Shares refresh counters with other clients.
	pub fn with_refresh_metrics(mut self, metrics: Arc<RefreshMetrics>) -> Self {
		self.refresh_metrics = metrics;

		self
	}

	/// Shared client state.
	pub fn core(&self) -> &ClientCore<C> {
		&self.core
	}

	/// Refresh counters for this client.
	pub fn refresh_metrics(&self) -> &Arc<RefreshMetrics> {
		&self.refresh_metrics
	}

	/// Builds the authorize URL.
	///
	/// Carries `client_id`, `response_type=code`, `redirect_uri`, `scope` (only when the
	/// descriptor has one), and a freshly persisted `state`. Entries in `extra` override the
	/// defaults; a caller-supplied `state` is persisted instead of a generated one.
	pub async fn build_auth_url(&self, extra: Params) -> Result<Url> {
		let core = &self.core;
		let descriptor = &core.descriptor;
		let redirect = core.callback_url(FLOW)?;
		let mut url = descriptor.endpoints.authorization.clone();
		let mut params = protocol::parse_query_string(url.query().unwrap_or_default());

		params.insert("client_id", &core.credentials.client_id);
		params.insert("response_type", "code");
		params.insert("redirect_uri", redirect.as_str());

		if let Some(scope) = descriptor.scope_param() {
			params.insert("scope", scope);
		}

		params.merge(extra);

		if descriptor.quirks.validate_auth_state {
			let state = match params.get("state") {
				Some(state) => state.to_owned(),
				None => {
					let state = flows::random_string(STATE_LEN);

					params.insert("state", state.clone());

					state
				},
			};

			core.store.save(&core.key(StoreSlot::AuthState), &state).await?;
		}

		url.set_query(Some(&protocol::build_query_string(&params)));

		Ok(url)
	}

	/// Exchanges an authorization code for an access token and persists it.
	///
	/// When state validation is on, the persisted `state` is consumed and must equal `state`.
	pub async fn fetch_access_token(
		&self,
		code: &str,
		state: Option<&str>,
		extra: Params,
	) -> Result<OAuthToken> {
		let core = &self.core;

		obs::observe(
			FlowKind::AccessToken,
			"oauth20.fetch_access_token",
			&core.descriptor.id,
			async move {
				let descriptor = &core.descriptor;

				if descriptor.quirks.validate_auth_state {
					let expected =
						core.store.take::<String>(&core.key(StoreSlot::AuthState)).await?;

					if expected.is_none() || expected.as_deref() != state {
						return Err(ProtocolError::StateMismatch { parameter: "state" }.into());
					}
				}

				let redirect = core.callback_url(FLOW)?;
				let mut form = self
					.credential_form(GrantType::AuthorizationCode)
					.with("redirect_uri", redirect.as_str())
					.with("code", code);

				core.strategy.augment_token_request(GrantType::AuthorizationCode, &mut form);
				form.merge(extra);

				let request = ApiRequest::new(
					descriptor.quirks.access_token_method,
					descriptor.endpoints.access_token.clone(),
					form,
				);
				let payload = core.execute(request).await?;
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

	/// Runs the refresh-token grant for `token` and persists the replacement.
	///
	/// The previous refresh token is kept when the provider does not rotate it. Every failure
	/// is reported as [`Error::TokenRefreshFailed`].
	pub async fn refresh_access_token(&self, token: &OAuthToken) -> Result<OAuthToken> {
		let core = &self.core;

		obs::observe(
			FlowKind::Refresh,
			"oauth20.refresh_access_token",
			&core.descriptor.id,
			async move {
				let result = self.refresh_inner(token).await;

				self.refresh_metrics.record(&result);

				result.map_err(Error::refresh_failed)
			},
		)
		.await
	}

	async fn refresh_inner(&self, token: &OAuthToken) -> Result<OAuthToken> {
		let core = &self.core;
		let descriptor = &core.descriptor;
		let refresh_token = token.refresh_token().ok_or(ConfigError::MissingRefreshToken)?;
		let mut form =
			self.credential_form(GrantType::RefreshToken).with("refresh_token", refresh_token);

		core.strategy.augment_token_request(GrantType::RefreshToken, &mut form);

		let request =
			ApiRequest::new(HttpMethod::Post, descriptor.endpoints.access_token.clone(), form);
		let payload = core.execute(request).await?;
		let mut fresh =
			OAuthToken::from_response(descriptor.protocol, payload, OffsetDateTime::now_utc())?;

		if fresh.refresh_token().is_none() {
			fresh = fresh.with_param("refresh_token", refresh_token);
		}

		core.store_token(Some(fresh.clone())).await?;

		Ok(fresh)
	}

	fn credential_form(&self, grant: GrantType) -> Params {
		let credentials = &self.core.credentials;

		Params::new()
			.with("client_id", &credentials.client_id)
			.with("client_secret", credentials.client_secret.expose())
			.with("grant_type", grant.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl OAuth20Client<ReqwestHttpClient> {
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
impl<C> OAuthClient for OAuth20Client<C>
where
	C: ?Sized + HttpTransport,
{
	fn descriptor(&self) -> &ProviderDescriptor {
		&self.core.descriptor
	}

	fn access_token(&self) -> ClientFuture<'_, Option<OAuthToken>> {
		Box::pin(async move {
			match self.core.stored_token().await? {
				Some(token) if token.is_expired() =>
					self.refresh_access_token(&token).await.map(Some),
				other => Ok(other),
			}
		})
	}

	fn set_access_token(&self, token: Option<OAuthToken>) -> ClientFuture<'_, ()> {
		Box::pin(self.core.store_token(token))
	}

	fn api_internal(&self, mut request: ApiRequest, token: OAuthToken) -> ClientFuture<'_, Value> {
		Box::pin(async move {
			self.core.strategy.decorate_api_request(&mut request, &token, &self.core.credentials)?;

			self.core.execute(request).await
		})
	}
}
impl<C> Debug for OAuth20Client<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth20Client")
			.field("core", &self.core)
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}

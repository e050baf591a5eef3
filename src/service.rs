//! Login services: a uniform authenticate/attributes contract over either OAuth driver.
//!
//! A login attempt crosses at least one redirect, so [`OAuthService`] keeps no in-process
//! progress. Every step loads the attempt's [`FlowRecord`] from the driver's store, advances
//! it by exactly one transition, and writes it back:
//!
//! ```text
//! NotStarted ── redirect ──▶ Redirected ── callback ──▶ CallbackReceived ─┬─▶ Authenticated
//!                                                                         ├─▶ Canceled
//!                                                                         └─▶ Failed
//! ```

pub mod attributes;
pub mod driver;
pub mod identity;
pub mod record;

pub use attributes::*;
pub use driver::*;
pub use identity::*;
pub use record::*;

// self
use crate::{
	_prelude::*,
	auth::{OAuthToken, ServiceId},
	error::ProtocolError,
	http::HttpMethod,
	obs::{self, FlowKind},
	protocol::Params,
	store::{SessionStore, StoreKey, StoreSlot},
};

const ATTRIBUTES_KEY: &str = "attributes";
const ERROR_KEY: &str = "error";

/// Boxed future returned by [`ExternalAuthService`] operations.
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Outcome of one [`ExternalAuthService::resume`] step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthStep {
	/// Send the user to this provider URL.
	Redirect(Url),
	/// The attempt completed with a durable access token.
	Authenticated,
	/// The user refused at the provider.
	Canceled,
}

/// Contract a hosting login controller drives.
pub trait ExternalAuthService
where
	Self: Send + Sync,
{
	/// Service identifier.
	fn id(&self) -> &ServiceId;

	/// Human-readable service title.
	fn title(&self) -> &str;

	/// Advances the attempt by one step based on the inbound request parameters.
	fn resume<'a>(&'a self, params: &'a Params) -> ServiceFuture<'a, AuthStep>;

	/// Runs [`resume`](Self::resume) and reports whether the attempt is complete.
	///
	/// `false` with an `Ok` result means a redirect or cancellation happened; check
	/// [`status`](Self::status) to tell them apart.
	fn authenticate<'a>(&'a self, params: &'a Params) -> ServiceFuture<'a, bool> {
		Box::pin(async move {
			obs::observe(FlowKind::Authenticate, "service.authenticate", self.id(), async move {
				Ok(matches!(self.resume(params).await?, AuthStep::Authenticated))
			})
			.await
		})
	}

	/// Current attempt state.
	fn status(&self) -> ServiceFuture<'_, AttemptState>;

	/// Returns `true` if the attempt completed and a valid token is available.
	fn is_authenticated(&self) -> ServiceFuture<'_, bool>;

	/// Normalized profile attributes, fetched once per attempt and cached.
	fn attributes(&self) -> ServiceFuture<'_, Attributes>;

	/// Identity derived from [`attributes`](Self::attributes).
	fn create_user_identity(&self) -> ServiceFuture<'_, UserIdentity> {
		Box::pin(async move {
			let attributes = self.attributes().await?;

			UserIdentity::from_attributes(self.id().clone(), attributes)
		})
	}

	/// Where to send the user after a successful login.
	fn redirect_success(&self) -> &Url;

	/// Where to send the user after a cancellation.
	fn redirect_cancel(&self) -> &Url;

	/// Drops the durable token and the attempt record.
	fn logout(&self) -> ServiceFuture<'_, ()>;
}

/// Provider "whoami" call used to build attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRequest {
	/// Absolute URL or path relative to the descriptor's API base.
	pub endpoint: String,
	/// HTTP method; defaults to `GET`.
	#[serde(default = "ProfileRequest::default_method")]
	pub method: HttpMethod,
	/// Extra request parameters (e.g. `fields`).
	#[serde(default)]
	pub params: Params,
}
impl ProfileRequest {
	/// `GET` request to `endpoint`.
	pub fn get(endpoint: impl Into<String>) -> Self {
		Self { endpoint: endpoint.into(), method: HttpMethod::Get, params: Params::new() }
	}

	/// Adds a request parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key, value);

		self
	}

	fn default_method() -> HttpMethod {
		HttpMethod::Get
	}
}

/// Per-service configuration; the callback URL belongs to the driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
	/// Service identifier (also namespaces the attempt record).
	pub id: ServiceId,
	/// Human-readable title.
	pub title: String,
	/// Redirect target after success.
	pub success_url: Url,
	/// Redirect target after cancellation.
	pub cancel_url: Url,
	/// Extra parameters for the provider redirect (e.g. `display=popup`).
	#[serde(default)]
	pub authorize_params: Params,
	/// Profile call.
	pub profile: ProfileRequest,
	/// Attribute normalization table.
	#[serde(default)]
	pub attribute_map: AttributeMap,
	/// Lifetime of an idle attempt record.
	#[serde(default = "ServiceConfig::default_attempt_ttl")]
	pub attempt_ttl: Duration,
}
impl ServiceConfig {
	const DEFAULT_ATTEMPT_TTL: Duration = Duration::minutes(15);

	/// Creates a configuration with default TTL and no attribute mapping.
	pub fn new(
		id: ServiceId,
		title: impl Into<String>,
		success_url: Url,
		cancel_url: Url,
		profile: ProfileRequest,
	) -> Self {
		Self {
			id,
			title: title.into(),
			success_url,
			cancel_url,
			authorize_params: Params::new(),
			profile,
			attribute_map: AttributeMap::new(),
			attempt_ttl: Self::DEFAULT_ATTEMPT_TTL,
		}
	}

	/// Sets the attribute normalization table.
	pub fn with_attribute_map(mut self, map: AttributeMap) -> Self {
		self.attribute_map = map;

		self
	}

	/// Sets extra provider redirect parameters.
	pub fn with_authorize_params(mut self, params: Params) -> Self {
		self.authorize_params = params;

		self
	}

	/// Overrides the attempt lifetime.
	pub fn with_attempt_ttl(mut self, ttl: Duration) -> Self {
		self.attempt_ttl = ttl;

		self
	}

	fn default_attempt_ttl() -> Duration {
		Self::DEFAULT_ATTEMPT_TTL
	}
}

/// [`ExternalAuthService`] backed by an OAuth 1.0 or OAuth 2.0 driver.
pub struct OAuthService<D>
where
	D: ?Sized + AuthDriver,
{
	config: ServiceConfig,
	driver: Arc<D>,
}
impl<D> OAuthService<D>
where
	D: ?Sized + AuthDriver,
{
	/// Binds `config` to `driver`.
	pub fn new(config: ServiceConfig, driver: impl Into<Arc<D>>) -> Self {
		Self { config, driver: driver.into() }
	}

	/// Service configuration.
	pub fn config(&self) -> &ServiceConfig {
		&self.config
	}

	/// Underlying protocol driver.
	pub fn driver(&self) -> &Arc<D> {
		&self.driver
	}

	/// Store key of the attempt record.
	pub fn record_key(&self) -> StoreKey {
		StoreKey::for_service(&self.config.id, StoreSlot::Attempt)
	}

	fn store(&self) -> &Arc<dyn SessionStore> {
		self.driver.session_store()
	}

	/// Loads the live attempt record; lapsed records are discarded.
	pub async fn record(&self) -> Result<Option<FlowRecord>> {
		let record = self.store().load::<FlowRecord>(&self.record_key()).await?;

		Ok(record.filter(|record| !record.is_expired_at(OffsetDateTime::now_utc())))
	}

	async fn save_state(
		&self,
		record: Option<FlowRecord>,
		state: AttemptState,
		payload: impl FnOnce(&mut BTreeMap<String, Value>),
	) -> Result<FlowRecord> {
		let now = OffsetDateTime::now_utc();
		let ttl = self.config.attempt_ttl;
		let mut record = record.unwrap_or_else(|| FlowRecord::new(state, ttl, now));

		record.advance(state, ttl, now);
		payload(&mut record.payload);
		self.store().save(&self.record_key(), &record).await?;

		Ok(record)
	}

	async fn has_valid_token(&self) -> Result<bool> {
		match self.driver.access_token().await {
			Ok(token) => Ok(token.as_ref().is_some_and(OAuthToken::is_valid)),
			// A token that can no longer be refreshed counts as absent.
			Err(Error::TokenRefreshFailed { .. }) => Ok(false),
			Err(e) => Err(e),
		}
	}

	async fn resume_inner(&self, params: &Params) -> Result<AuthStep> {
		let record = self.record().await?;
		let state = record.as_ref().map_or(AttemptState::NotStarted, |record| record.state);

		match self.driver.classify_callback(params) {
			CallbackKind::Absent => {
				// The durable token outlives the attempt record.
				if self.has_valid_token().await? {
					if state != AttemptState::Authenticated {
						self.save_state(None, AttemptState::Authenticated, |_| {}).await?;
					}

					return Ok(AuthStep::Authenticated);
				}

				let url = self.driver.begin(self.config.authorize_params.clone()).await?;

				self.save_state(None, AttemptState::Redirected, |_| {}).await?;

				Ok(AuthStep::Redirect(url))
			},
			CallbackKind::Canceled { .. } => {
				self.driver.abandon().await?;
				self.save_state(record, AttemptState::Canceled, |_| {}).await?;

				Ok(AuthStep::Canceled)
			},
			CallbackKind::Error { error, description } => {
				self.driver.abandon().await?;

				let failure = ProtocolError::Provider { error, description };
				let message = failure.to_string();

				self.save_state(record, AttemptState::Failed, |payload| {
					payload.insert(ERROR_KEY.into(), Value::String(message));
				})
				.await?;

				Err(failure.into())
			},
			CallbackKind::Grant => {
				let record =
					self.save_state(record, AttemptState::CallbackReceived, |payload| {
						payload.remove(ATTRIBUTES_KEY);
						payload.remove(ERROR_KEY);
					})
					.await?;

				match self.driver.complete(params).await {
					Ok(_) => {
						self.save_state(Some(record), AttemptState::Authenticated, |_| {}).await?;

						Ok(AuthStep::Authenticated)
					},
					Err(e) if e.is_user_canceled() => {
						self.save_state(Some(record), AttemptState::Canceled, |_| {}).await?;

						Ok(AuthStep::Canceled)
					},
					Err(e) => {
						let message = e.to_string();

						self.save_state(Some(record), AttemptState::Failed, |payload| {
							payload.insert(ERROR_KEY.into(), Value::String(message));
						})
						.await?;

						Err(e)
					},
				}
			},
		}
	}

	async fn attributes_inner(&self) -> Result<Attributes> {
		let record = self.record().await?;

		if let Some(cached) = record
			.as_ref()
			.and_then(|record| record.payload.get(ATTRIBUTES_KEY))
			.and_then(Value::as_object)
		{
			return Ok(cached.iter().map(|(name, value)| (name.clone(), value.clone())).collect());
		}

		let profile = &self.config.profile;
		let body =
			self.driver.api(&profile.endpoint, profile.method, profile.params.clone()).await?;
		let attributes = self.config.attribute_map.normalize(&body);

		if let Some(record) = record {
			let cached = Value::Object(attributes.clone().into_iter().collect());
			let state = record.state;

			self.save_state(Some(record), state, |payload| {
				payload.insert(ATTRIBUTES_KEY.into(), cached);
			})
			.await?;
		}

		Ok(attributes)
	}
}
impl<D> ExternalAuthService for OAuthService<D>
where
	D: ?Sized + AuthDriver,
{
	fn id(&self) -> &ServiceId {
		&self.config.id
	}

	fn title(&self) -> &str {
		&self.config.title
	}

	fn resume<'a>(&'a self, params: &'a Params) -> ServiceFuture<'a, AuthStep> {
		Box::pin(self.resume_inner(params))
	}

	fn status(&self) -> ServiceFuture<'_, AttemptState> {
		Box::pin(async move {
			Ok(self.record().await?.map_or(AttemptState::NotStarted, |record| record.state))
		})
	}

	fn is_authenticated(&self) -> ServiceFuture<'_, bool> {
		Box::pin(async move {
			let completed = self.status().await? == AttemptState::Authenticated;

			Ok(completed && self.has_valid_token().await?)
		})
	}

	fn attributes(&self) -> ServiceFuture<'_, Attributes> {
		Box::pin(self.attributes_inner())
	}

	fn redirect_success(&self) -> &Url {
		&self.config.success_url
	}

	fn redirect_cancel(&self) -> &Url {
		&self.config.cancel_url
	}

	fn logout(&self) -> ServiceFuture<'_, ()> {
		Box::pin(async move {
			self.driver.set_access_token(None).await?;
			self.store().remove(&self.record_key()).await?;

			Ok(())
		})
	}
}
impl<D> Debug for OAuthService<D>
where
	D: ?Sized + AuthDriver,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthService")
			.field("id", &self.config.id)
			.field("title", &self.config.title)
			.field("provider", &self.driver.descriptor().id)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn service_config_defaults_apply_when_deserialized() {
		let config: ServiceConfig = serde_json::from_value(serde_json::json!({
			"id": "github",
			"title": "GitHub",
			"success_url": "https://app.example.com/welcome",
			"cancel_url": "https://app.example.com/login",
			"profile": { "endpoint": "user" }
		}))
		.expect("Service config should deserialize.");

		assert_eq!(config.attempt_ttl, Duration::minutes(15));
		assert_eq!(config.profile.method, HttpMethod::Get);
		assert!(config.attribute_map.is_empty());
		assert!(config.authorize_params.is_empty());
	}

	#[test]
	fn profile_request_builder_collects_params() {
		let profile = ProfileRequest::get("me").with_param("fields", "id,name");

		assert_eq!(profile.params.get("fields"), Some("id,name"));
		assert_eq!(profile.method, HttpMethod::Get);
	}
}

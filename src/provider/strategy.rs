//! Provider strategy hooks that customize API calls, token requests, and callbacks.
//!
//! Most providers work with [`DefaultProviderStrategy`]. The few that relocate the access
//! token or demand an extra keyed hash get one of the built-in variants (or a custom
//! implementation) injected into the OAuth 2.0 client instead of a dedicated driver.

// crates.io
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::{ClientCredentials, OAuthToken},
	error::ConfigError,
	http::ApiRequest,
	protocol::Params,
	provider::{GrantType, ProtocolVersion},
};

/// Strategy hook that lets providers adjust requests without subclassing a driver.
///
/// Every method has a default, so implementors override only what they need. OAuth 1.0
/// API calls are signed instead of decorated, so [`decorate_api_request`] only runs for
/// OAuth 2.0 clients.
///
/// [`decorate_api_request`]: ProviderStrategy::decorate_api_request
pub trait ProviderStrategy: Send + Sync {
	/// Attaches the access token to an outgoing API request.
	///
	/// The default sends it as the `access_token` request parameter.
	fn decorate_api_request(
		&self,
		request: &mut ApiRequest,
		token: &OAuthToken,
		_credentials: &ClientCredentials,
	) -> Result<()> {
		request.params.insert("access_token", token.token().expose());

		Ok(())
	}

	/// Adds provider-specific form fields to token-endpoint requests.
	fn augment_token_request(&self, _grant: GrantType, _form: &mut Params) {}

	/// Returns the cancellation reason when callback parameters report a user refusal.
	fn cancellation(&self, protocol: ProtocolVersion, params: &Params) -> Option<String> {
		default_cancellation(protocol, params)
	}
}

/// Standard cancellation markers.
///
/// OAuth 2.0 providers report `error=access_denied` (or `user_denied`, or
/// `error_reason=user_denied`); OAuth 1.0 providers redirect back with a `denied` parameter.
pub fn default_cancellation(protocol: ProtocolVersion, params: &Params) -> Option<String> {
	if protocol.is_oauth1() {
		return params.contains_key("denied").then(|| "denied".to_owned());
	}

	match (params.get("error"), params.get("error_reason")) {
		(Some(error @ ("access_denied" | "user_denied")), _) => Some(error.to_owned()),
		(_, Some("user_denied")) => Some("user_denied".to_owned()),
		_ => None,
	}
}

/// Strategy sending the token as the `access_token` parameter.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {}

/// Strategy sending the token under a provider-specific parameter name (e.g. `oauth_token`).
#[derive(Clone, Debug)]
pub struct TokenParamStrategy {
	param: String,
}
impl TokenParamStrategy {
	/// Creates a strategy using `param` as the token parameter name.
	pub fn new(param: impl Into<String>) -> Self {
		Self { param: param.into() }
	}
}
impl ProviderStrategy for TokenParamStrategy {
	fn decorate_api_request(
		&self,
		request: &mut ApiRequest,
		token: &OAuthToken,
		_credentials: &ClientCredentials,
	) -> Result<()> {
		request.params.insert(self.param.as_str(), token.token().expose());

		Ok(())
	}
}

/// Strategy sending the token as an `Authorization: Bearer` header.
#[derive(Debug, Default)]
pub struct BearerHeaderStrategy;
impl ProviderStrategy for BearerHeaderStrategy {
	fn decorate_api_request(
		&self,
		request: &mut ApiRequest,
		token: &OAuthToken,
		_credentials: &ClientCredentials,
	) -> Result<()> {
		let value = format!("Bearer {}", token.token().expose());

		request.headers.insert("Authorization".into(), value);

		Ok(())
	}
}

/// Strategy adding `appsecret_proof`: hex HMAC-SHA256 of the access token keyed by the client
/// secret, alongside the usual `access_token` parameter.
#[derive(Debug, Default)]
pub struct AppSecretProofStrategy;
impl AppSecretProofStrategy {
	/// Computes the proof for `token` with `secret`.
	pub fn proof(token: &str, secret: &str) -> Result<String> {
		let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(secret.as_bytes())
			.map_err(|e| ConfigError::SigningKey { message: e.to_string() })?;

		mac.update(token.as_bytes());

		Ok(hex::encode(mac.finalize().into_bytes()))
	}
}
impl ProviderStrategy for AppSecretProofStrategy {
	fn decorate_api_request(
		&self,
		request: &mut ApiRequest,
		token: &OAuthToken,
		credentials: &ClientCredentials,
	) -> Result<()> {
		let proof = Self::proof(token.token().expose(), credentials.client_secret.expose())?;

		request.params.insert("access_token", token.token().expose());
		request.params.insert("appsecret_proof", proof);

		Ok(())
	}
}

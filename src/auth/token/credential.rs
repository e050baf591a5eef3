//! Provider-issued credential value object shared by both protocol drivers.

// self
use crate::{
	_prelude::*,
	auth::token::secret::TokenSecret,
	error::ProtocolError,
	provider::ProtocolVersion,
};

/// Errors produced by [`OAuthTokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum OAuthTokenBuilderError {
	/// Issued when the token value is empty.
	#[error("Token value is required.")]
	EmptyToken,
	/// Issued when the expiry precedes the creation instant.
	#[error("Token expiry must not precede its creation instant.")]
	ExpiryBeforeCreation,
}

/// Immutable credential issued by a provider.
///
/// OAuth 1.0 tokens carry a token secret and never expire; OAuth 2.0 tokens may carry an
/// absolute expiry. Every other field the provider returned (`refresh_token`, `token_type`,
/// `user_id`, ...) is kept in [`params`](Self::params). Refreshing replaces the whole value.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthToken {
	token: TokenSecret,
	token_secret: Option<TokenSecret>,
	created_at: OffsetDateTime,
	expires_at: Option<OffsetDateTime>,
	#[serde(default)]
	params: BTreeMap<String, Value>,
}
impl OAuthToken {
	/// Returns a builder seeded with the token value.
	pub fn builder(token: impl Into<String>) -> OAuthTokenBuilder {
		OAuthTokenBuilder::new(token.into())
	}

	/// Decodes a token endpoint payload.
	///
	/// The token is read from `oauth_token` (OAuth 1.0) or `access_token` (OAuth 2.0);
	/// `expires_in` (or the legacy `expires`) seconds become an absolute expiry relative to
	/// `now`. Non-positive or non-numeric lifetimes mean "no expiry".
	pub fn from_response(
		protocol: ProtocolVersion,
		payload: Value,
		now: OffsetDateTime,
	) -> Result<Self> {
		let fields: TokenFields = serde_path_to_error::deserialize(payload.clone())
			.map_err(|source| ProtocolError::TokenResponse { source })?;
		let (field, token) = if protocol.is_oauth1() {
			("oauth_token", fields.oauth_token)
		} else {
			("access_token", fields.access_token)
		};
		let token =
			token.filter(|value| !value.is_empty()).ok_or(ProtocolError::MissingField { field })?;
		let mut params = match payload {
			Value::Object(map) => map.into_iter().collect::<BTreeMap<_, _>>(),
			_ => BTreeMap::new(),
		};

		params.remove(field);
		params.remove("oauth_token_secret");

		let mut builder = Self::builder(token).created_at(now).params(params);

		if let Some(secret) = fields.oauth_token_secret {
			builder = builder.token_secret(secret);
		}
		if let Some(seconds) =
			fields.expires_in.or(fields.expires).and_then(Lifetime::seconds).filter(|s| *s > 0)
		{
			builder = builder.expires_in(Duration::seconds(seconds));
		}

		builder.build().map_err(|e| Error::Config(e.into()))
	}

	/// Token value sent to the provider.
	pub fn token(&self) -> &TokenSecret {
		&self.token
	}

	/// OAuth 1.0 token secret, if any.
	pub fn token_secret(&self) -> Option<&TokenSecret> {
		self.token_secret.as_ref()
	}

	/// Instant the token was received.
	pub fn created_at(&self) -> OffsetDateTime {
		self.created_at
	}

	/// Absolute expiry, if the provider declared one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}

	/// Extra provider fields.
	pub fn params(&self) -> &BTreeMap<String, Value> {
		&self.params
	}

	/// Looks up a single extra provider field.
	pub fn param(&self, key: &str) -> Option<&Value> {
		self.params.get(key)
	}

	/// Refresh token issued alongside an OAuth 2.0 access token.
	pub fn refresh_token(&self) -> Option<&str> {
		self.param("refresh_token").and_then(Value::as_str).filter(|value| !value.is_empty())
	}

	/// Returns a copy carrying an additional (or replaced) provider field.
	pub fn with_param(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		let mut next = self.clone();

		next.params.insert(key.into(), value.into());

		next
	}

	/// Returns `true` if the token has an expiry at or before `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expiry| expiry <= instant)
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the token may be used for an API call right now.
	pub fn is_valid(&self) -> bool {
		!self.token.is_empty() && !self.is_expired()
	}
}
impl Debug for OAuthToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthToken")
			.field("token", &self.token)
			.field("token_secret", &self.token_secret)
			.field("created_at", &self.created_at)
			.field("expires_at", &self.expires_at)
			.field("params", &self.params.keys().collect::<Vec<_>>())
			.finish()
	}
}

/// Builder for [`OAuthToken`].
#[derive(Clone, Debug)]
pub struct OAuthTokenBuilder {
	token: TokenSecret,
	token_secret: Option<TokenSecret>,
	created_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	params: BTreeMap<String, Value>,
}
impl OAuthTokenBuilder {
	fn new(token: String) -> Self {
		Self {
			token: TokenSecret::new(token),
			token_secret: None,
			created_at: None,
			expires_at: None,
			expires_in: None,
			params: BTreeMap::new(),
		}
	}

	/// Sets the OAuth 1.0 token secret.
	pub fn token_secret(mut self, secret: impl Into<String>) -> Self {
		self.token_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets the creation instant; defaults to the current clock.
	pub fn created_at(mut self, instant: OffsetDateTime) -> Self {
		self.created_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a lifetime relative to the creation instant.
	pub fn expires_in(mut self, lifetime: Duration) -> Self {
		self.expires_in = Some(lifetime);

		self
	}

	/// Adds one extra provider field.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.params.insert(key.into(), value.into());

		self
	}

	/// Replaces all extra provider fields.
	pub fn params(mut self, params: BTreeMap<String, Value>) -> Self {
		self.params = params;

		self
	}

	/// Consumes the builder and produces an [`OAuthToken`].
	pub fn build(self) -> Result<OAuthToken, OAuthTokenBuilderError> {
		if self.token.is_empty() {
			return Err(OAuthTokenBuilderError::EmptyToken);
		}

		let created_at = self.created_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(lifetime)) => Some(created_at + lifetime),
			(None, None) => None,
		};

		if expires_at.is_some_and(|expiry| expiry < created_at) {
			return Err(OAuthTokenBuilderError::ExpiryBeforeCreation);
		}

		Ok(OAuthToken {
			token: self.token,
			token_secret: self.token_secret,
			created_at,
			expires_at,
			params: self.params,
		})
	}
}

#[derive(Deserialize)]
struct TokenFields {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	oauth_token: Option<String>,
	#[serde(default)]
	oauth_token_secret: Option<String>,
	#[serde(default)]
	expires_in: Option<Lifetime>,
	#[serde(default)]
	expires: Option<Lifetime>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lifetime {
	Integer(i64),
	Float(f64),
	Text(String),
}
impl Lifetime {
	fn seconds(self) -> Option<i64> {
		match self {
			Self::Integer(value) => Some(value),
			Self::Float(value) => Some(value as i64),
			Self::Text(value) => value.trim().parse().ok(),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros;
	// self
	use super::*;

	#[test]
	fn oauth2_payload_converts_expires_in_to_absolute_expiry() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let token = OAuthToken::from_response(
			ProtocolVersion::OAuth20,
			json!({
				"access_token": "access",
				"refresh_token": "refresh",
				"token_type": "bearer",
				"expires_in": 3600
			}),
			now,
		)
		.expect("OAuth 2.0 payload should decode.");

		assert_eq!(token.token().expose(), "access");
		assert_eq!(token.refresh_token(), Some("refresh"));
		assert_eq!(token.expires_at(), Some(macros::datetime!(2025-01-01 01:00 UTC)));
		assert!(token.param("access_token").is_none());
		assert!(token.is_expired_at(macros::datetime!(2025-01-01 01:00 UTC)));
		assert!(!token.is_expired_at(macros::datetime!(2025-01-01 00:59 UTC)));
	}

	#[test]
	fn oauth1_payload_keeps_secret_and_never_expires() {
		let token = OAuthToken::from_response(
			ProtocolVersion::OAuth10a,
			json!({ "oauth_token": "tok", "oauth_token_secret": "ts", "user_id": "42" }),
			OffsetDateTime::now_utc(),
		)
		.expect("OAuth 1.0 payload should decode.");

		assert_eq!(token.token_secret().map(TokenSecret::expose), Some("ts"));
		assert_eq!(token.expires_at(), None);
		assert_eq!(token.param("user_id"), Some(&json!("42")));
		assert!(token.is_valid());
	}

	#[test]
	fn string_and_legacy_lifetimes_are_accepted() {
		let now = macros::datetime!(2025-01-01 00:00 UTC);
		let text = OAuthToken::from_response(
			ProtocolVersion::OAuth20,
			json!({ "access_token": "a", "expires_in": "60" }),
			now,
		)
		.expect("String lifetime should decode.");
		let legacy = OAuthToken::from_response(
			ProtocolVersion::OAuth20,
			json!({ "access_token": "a", "expires": 0 }),
			now,
		)
		.expect("Zero lifetime should decode.");

		assert_eq!(text.expires_at(), Some(macros::datetime!(2025-01-01 00:01 UTC)));
		assert_eq!(legacy.expires_at(), None);
	}

	#[test]
	fn missing_token_field_is_reported() {
		let err = OAuthToken::from_response(
			ProtocolVersion::OAuth20,
			json!({ "token_type": "bearer" }),
			OffsetDateTime::now_utc(),
		)
		.expect_err("Payload without access_token should fail.");

		assert!(matches!(
			err,
			Error::Protocol(ProtocolError::MissingField { field: "access_token" })
		));
	}

	#[test]
	fn wrongly_typed_field_reports_path() {
		let err = OAuthToken::from_response(
			ProtocolVersion::OAuth20,
			json!({ "access_token": 12 }),
			OffsetDateTime::now_utc(),
		)
		.expect_err("Numeric access_token should fail.");

		match err {
			Error::Protocol(ProtocolError::TokenResponse { source }) =>
				assert_eq!(source.path().to_string(), "access_token"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn builder_validates_inputs() {
		assert_eq!(OAuthToken::builder("").build(), Err(OAuthTokenBuilderError::EmptyToken));
		assert_eq!(
			OAuthToken::builder("t")
				.created_at(macros::datetime!(2025-01-01 01:00 UTC))
				.expires_at(macros::datetime!(2025-01-01 00:00 UTC))
				.build(),
			Err(OAuthTokenBuilderError::ExpiryBeforeCreation)
		);
	}

	#[test]
	fn with_param_returns_a_new_value() {
		let token = OAuthToken::builder("t").build().expect("Token fixture should build.");
		let updated = token.with_param("refresh_token", "r");

		assert_eq!(token.refresh_token(), None);
		assert_eq!(updated.refresh_token(), Some("r"));
	}

	#[test]
	fn debug_output_is_redacted() {
		let token = OAuthToken::builder("visible-token")
			.token_secret("visible-secret")
			.param("refresh_token", "visible-refresh")
			.build()
			.expect("Token fixture should build.");
		let rendered = format!("{token:?}");

		assert!(!rendered.contains("visible-token"));
		assert!(!rendered.contains("visible-secret"));
		assert!(!rendered.contains("visible-refresh"));
	}
}

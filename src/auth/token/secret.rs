//! Redacting wrapper for token values, token secrets, and consumer secrets.

// self
use crate::_prelude::*;

/// Sensitive string (access token, token secret, client secret) that never formats its value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw value for signing or transmission; never log it.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` for an empty secret (e.g. an OAuth 1.0 token without a secret).
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_never_leak_the_value() {
		let secret = TokenSecret::from("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(<redacted>)");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.expose(), "super-secret");
	}

	#[test]
	fn serializes_as_plain_string_for_storage() {
		let secret = TokenSecret::new("abc");
		let json = serde_json::to_string(&secret).expect("Secret should serialize.");

		assert_eq!(json, "\"abc\"");
		assert_eq!(
			serde_json::from_str::<TokenSecret>(&json).expect("Secret should deserialize."),
			secret
		);
	}
}

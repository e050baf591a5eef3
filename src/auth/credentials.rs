//! Consumer (OAuth 1.0) and client (OAuth 2.0) credentials issued by a provider.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Application credentials: consumer key/secret for OAuth 1.0, client id/secret for OAuth 2.0.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
	/// Public identifier of the application.
	pub client_id: String,
	/// Shared secret; redacted in debug output.
	pub client_secret: TokenSecret,
}
impl ClientCredentials {
	/// Creates credentials from the raw identifier and secret.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self { client_id: client_id.into(), client_secret: TokenSecret::new(client_secret) }
	}
}
impl Debug for ClientCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientCredentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &self.client_secret)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn debug_redacts_the_secret() {
		let credentials = ClientCredentials::new("app-id", "app-secret");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("app-id"));
		assert!(!rendered.contains("app-secret"));
	}
}

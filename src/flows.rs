//! Protocol drivers built on [`ClientCore`](crate::client::ClientCore).
//!
//! [`OAuth10Client`] runs the three-legged OAuth 1.0/1.0a handshake with signed requests;
//! [`OAuth20Client`] runs the authorization-code grant with refresh. Both persist every piece
//! of cross-request state in the injected [`SessionStore`](crate::store::SessionStore), so a
//! fresh client built for each inbound request picks the flow up where the last one left it.

pub mod oauth10;
pub mod oauth20;

pub use oauth10::*;
pub use oauth20::*;

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::{ProtocolVersion, ProviderDescriptor},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// OAuth 1.0 driver specialized for the crate's default reqwest transport.
pub type ReqwestOAuth10Client = OAuth10Client<ReqwestHttpClient>;
#[cfg(feature = "reqwest")]
/// OAuth 2.0 driver specialized for the crate's default reqwest transport.
pub type ReqwestOAuth20Client = OAuth20Client<ReqwestHttpClient>;

/// Rejects descriptors whose protocol the driver does not speak.
pub(crate) fn ensure_protocol(
	descriptor: &ProviderDescriptor,
	accepts: impl Fn(ProtocolVersion) -> bool,
) -> Result<(), ConfigError> {
	if accepts(descriptor.protocol) {
		Ok(())
	} else {
		Err(ConfigError::ProtocolMismatch {
			descriptor: descriptor.id.to_string(),
			protocol: descriptor.protocol.as_str(),
		})
	}
}

/// Random alphanumeric string used for anti-forgery values.
pub(crate) fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::ProviderId;

	#[test]
	fn random_strings_have_requested_length_and_differ() {
		let a = random_string(32);
		let b = random_string(32);

		assert_eq!(a.len(), 32);
		assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(a, b);
	}

	#[test]
	fn protocol_mismatch_names_descriptor_and_protocol() {
		let descriptor = ProviderDescriptor::builder(
			ProviderId::new("acme").expect("Provider fixture should be valid."),
			ProtocolVersion::OAuth20,
		)
		.authorization_endpoint(
			Url::parse("https://acme.example.com/authorize").expect("Authorize URL should parse."),
		)
		.access_token_endpoint(
			Url::parse("https://acme.example.com/token").expect("Token URL should parse."),
		)
		.build()
		.expect("Descriptor fixture should build.");
		let err = ensure_protocol(&descriptor, ProtocolVersion::is_oauth1)
			.expect_err("OAuth 2.0 descriptor should be rejected by an OAuth 1 check.");

		assert!(matches!(
			err,
			ConfigError::ProtocolMismatch { ref descriptor, protocol: "2.0" } if descriptor == "acme"
		));
	}
}

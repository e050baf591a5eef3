//! Pluggable OAuth 1.0 signature methods.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
// self
use crate::{_prelude::*, error::ConfigError};

/// Digest strategy applied to the signature base string.
///
/// Swapping the method never touches the driver: it only supplies the protocol-visible
/// `oauth_signature_method` name and the signature text.
pub trait SignatureMethod
where
	Self: Send + Sync,
{
	/// Value sent as `oauth_signature_method`.
	fn name(&self) -> &str;

	/// Computes the signature over `base_string` with the `consumer&token` signing key.
	fn generate_signature(&self, base_string: &str, key: &str) -> Result<String>;

	/// Whether the method leaks the key unless every endpoint uses HTTPS.
	fn requires_secure_transport(&self) -> bool {
		false
	}
}

/// `HMAC-SHA1`, the method every OAuth 1.0 provider supports.
#[derive(Clone, Copy, Debug, Default)]
pub struct HmacSha1;
impl SignatureMethod for HmacSha1 {
	fn name(&self) -> &str {
		"HMAC-SHA1"
	}

	fn generate_signature(&self, base_string: &str, key: &str) -> Result<String> {
		let mut mac = <Hmac<Sha1> as Mac>::new_from_slice(key.as_bytes())
			.map_err(|e| ConfigError::SigningKey { message: e.to_string() })?;

		mac.update(base_string.as_bytes());

		Ok(STANDARD.encode(mac.finalize().into_bytes()))
	}
}

/// `HMAC-SHA256`, offered by some newer OAuth 1.0 deployments.
#[derive(Clone, Copy, Debug, Default)]
pub struct HmacSha256;
impl SignatureMethod for HmacSha256 {
	fn name(&self) -> &str {
		"HMAC-SHA256"
	}

	fn generate_signature(&self, base_string: &str, key: &str) -> Result<String> {
		let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key.as_bytes())
			.map_err(|e| ConfigError::SigningKey { message: e.to_string() })?;

		mac.update(base_string.as_bytes());

		Ok(STANDARD.encode(mac.finalize().into_bytes()))
	}
}

/// `PLAINTEXT`: the signature is the signing key itself, so HTTPS is mandatory.
#[derive(Clone, Copy, Debug, Default)]
pub struct Plaintext;
impl SignatureMethod for Plaintext {
	fn name(&self) -> &str {
		"PLAINTEXT"
	}

	fn generate_signature(&self, _base_string: &str, key: &str) -> Result<String> {
		Ok(key.to_owned())
	}

	fn requires_secure_transport(&self) -> bool {
		true
	}
}

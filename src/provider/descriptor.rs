//! Endpoint configuration shared by both protocol drivers.
//!
//! A descriptor is read-only once built: it names the protocol revision, the provider's
//! endpoints, the requested scope, and a handful of quirks. Hosts usually deserialize
//! descriptors from configuration files, one per configured provider.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;
/// Protocol revisions and OAuth 2.0 grants.
pub mod version;

pub use builder::*;
pub use quirks::*;
pub use version::*;

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, ScopeSet},
	error::ConfigError,
};

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Page the user is redirected to for granting access.
	pub authorization: Url,
	/// OAuth 1.0 temporary-credential endpoint.
	pub request_token: Option<Url>,
	/// Endpoint exchanging a grant (verifier or code) for an access token.
	pub access_token: Url,
	/// Base URL that relative API endpoints are resolved against.
	pub api_base: Option<Url>,
}

/// Immutable provider descriptor consumed by drivers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Protocol revision the provider speaks.
	pub protocol: ProtocolVersion,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Scope requested during authorization; empty means no `scope` parameter.
	#[serde(default)]
	pub scope: ScopeSet,
	/// Provider-specific quirks.
	#[serde(default)]
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier and protocol revision.
	pub fn builder(id: ProviderId, protocol: ProtocolVersion) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id, protocol)
	}

	/// Scope string joined with the provider delimiter, or `None` for an empty scope.
	pub fn scope_param(&self) -> Option<String> {
		self.scope.format(self.quirks.scope_delimiter)
	}

	/// Resolves an API endpoint: absolute URLs pass through, relative paths join the API base.
	pub fn resolve_api_url(&self, endpoint: &str) -> Result<Url, ConfigError> {
		if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
			return parse_url(endpoint);
		}

		let base = self
			.endpoints
			.api_base
			.as_ref()
			.ok_or_else(|| ConfigError::MissingApiBase { endpoint: endpoint.to_owned() })?;
		let joined = format!(
			"{}/{}",
			base.as_str().trim_end_matches('/'),
			endpoint.trim_start_matches('/')
		);

		parse_url(&joined)
	}
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidUrl { url: raw.to_owned(), source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn descriptor(api_base: Option<&str>) -> ProviderDescriptor {
		let mut builder = ProviderDescriptor::builder(
			ProviderId::new("acme").expect("Provider fixture should be valid."),
			ProtocolVersion::OAuth20,
		)
		.authorization_endpoint(
			Url::parse("https://acme.example.com/oauth/authorize")
				.expect("Authorize fixture should parse."),
		)
		.access_token_endpoint(
			Url::parse("https://acme.example.com/oauth/token").expect("Token fixture should parse."),
		);

		if let Some(base) = api_base {
			builder = builder.api_base(Url::parse(base).expect("API base fixture should parse."));
		}

		builder.build().expect("Descriptor fixture should build.")
	}

	#[test]
	fn relative_endpoints_join_the_api_base() {
		let with_slash = descriptor(Some("https://api.acme.example.com/v2/"));
		let without_slash = descriptor(Some("https://api.acme.example.com/v2"));

		for descriptor in [with_slash, without_slash] {
			assert_eq!(
				descriptor.resolve_api_url("/me").expect("Relative endpoint should resolve.").as_str(),
				"https://api.acme.example.com/v2/me"
			);
		}
	}

	#[test]
	fn absolute_endpoints_bypass_the_api_base() {
		let url = descriptor(None)
			.resolve_api_url("https://other.example.com/profile?fields=id")
			.expect("Absolute endpoint should resolve.");

		assert_eq!(url.as_str(), "https://other.example.com/profile?fields=id");
	}

	#[test]
	fn relative_endpoint_without_base_is_rejected() {
		assert!(matches!(
			descriptor(None).resolve_api_url("me"),
			Err(ConfigError::MissingApiBase { .. })
		));
	}

	#[test]
	fn scope_param_uses_delimiter_and_omits_empty_scope() {
		let mut descriptor = descriptor(None);

		assert_eq!(descriptor.scope_param(), None);

		descriptor.scope = ScopeSet::new(["email", "user_likes"]).expect("Scope should be valid.");
		descriptor.quirks.scope_delimiter = ',';

		assert_eq!(descriptor.scope_param(), Some("email,user_likes".into()));
	}
}

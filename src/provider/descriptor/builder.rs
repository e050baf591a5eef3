// self
use crate::{
	_prelude::*,
	auth::{ProviderId, ScopeSet},
	provider::{ProtocolVersion, ProviderDescriptor, ProviderEndpoints, ProviderQuirks},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum DescriptorError {
	/// Authorization endpoint is required for every protocol revision.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Access-token endpoint is mandatory for all flows.
	#[error("Missing access-token endpoint.")]
	MissingAccessTokenEndpoint,
	/// OAuth 1.0 providers must declare a request-token endpoint.
	#[error("OAuth 1.0 descriptors require a request-token endpoint.")]
	MissingRequestTokenEndpoint,
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: ProviderId,
	/// Protocol revision the provider speaks.
	pub protocol: ProtocolVersion,
	/// Authorization (user grant) endpoint.
	pub authorization_endpoint: Option<Url>,
	/// OAuth 1.0 request-token endpoint.
	pub request_token_endpoint: Option<Url>,
	/// Access-token endpoint.
	pub access_token_endpoint: Option<Url>,
	/// Base URL for relative API endpoints.
	pub api_base: Option<Url>,
	/// Scope requested during authorization.
	pub scope: ScopeSet,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier and revision.
	pub fn new(id: ProviderId, protocol: ProtocolVersion) -> Self {
		Self {
			id,
			protocol,
			authorization_endpoint: None,
			request_token_endpoint: None,
			access_token_endpoint: None,
			api_base: None,
			scope: ScopeSet::default(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the OAuth 1.0 request-token endpoint.
	pub fn request_token_endpoint(mut self, url: Url) -> Self {
		self.request_token_endpoint = Some(url);

		self
	}

	/// Sets the access-token endpoint.
	pub fn access_token_endpoint(mut self, url: Url) -> Self {
		self.access_token_endpoint = Some(url);

		self
	}

	/// Sets the API base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Sets the requested scope.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, DescriptorError> {
		let authorization =
			self.authorization_endpoint.ok_or(DescriptorError::MissingAuthorizationEndpoint)?;
		let access_token =
			self.access_token_endpoint.ok_or(DescriptorError::MissingAccessTokenEndpoint)?;
		let endpoints = ProviderEndpoints {
			authorization,
			request_token: self.request_token_endpoint,
			access_token,
			api_base: self.api_base,
		};
		let descriptor = ProviderDescriptor {
			id: self.id,
			protocol: self.protocol,
			endpoints,
			scope: self.scope,
			quirks: self.quirks,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for descriptors built in code or deserialized from configuration.
	pub fn validate(&self) -> Result<(), DescriptorError> {
		if self.protocol.is_oauth1() && self.endpoints.request_token.is_none() {
			return Err(DescriptorError::MissingRequestTokenEndpoint);
		}
		if self.quirks.scope_delimiter.is_control() {
			return Err(DescriptorError::InvalidScopeDelimiter {
				delimiter: self.quirks.scope_delimiter,
			});
		}

		Ok(())
	}
}

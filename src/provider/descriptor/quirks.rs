// self
use crate::{_prelude::*, http::HttpMethod};

/// Provider-specific toggles that influence how flows talk to the endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Character used to join scopes when constructing `scope` parameters.
	pub scope_delimiter: char,
	/// HTTP method for the OAuth 1.0 request-token call.
	pub request_token_method: HttpMethod,
	/// HTTP method for the access-token exchange (both protocols).
	pub access_token_method: HttpMethod,
	/// Whether OAuth 2.0 flows send and verify an anti-forgery `state` value.
	pub validate_auth_state: bool,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self {
			scope_delimiter: ' ',
			request_token_method: HttpMethod::Post,
			access_token_method: HttpMethod::Post,
			validate_auth_state: true,
		}
	}
}

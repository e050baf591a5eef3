// self
use crate::_prelude::*;

/// OAuth protocol revision spoken by a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVersion {
	/// OAuth 1.0 (callback sent with the authorize redirect, no verifier).
	#[serde(rename = "1.0")]
	OAuth10,
	/// OAuth 1.0a (callback confirmed at request-token time, verifier returned).
	#[serde(rename = "1.0a")]
	OAuth10a,
	/// OAuth 2.0 authorization-code grant.
	#[serde(rename = "2.0")]
	OAuth20,
}
impl ProtocolVersion {
	/// Returns `true` for either OAuth 1.0 revision.
	pub fn is_oauth1(self) -> bool {
		matches!(self, Self::OAuth10 | Self::OAuth10a)
	}

	/// Human-readable revision label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::OAuth10 => "1.0",
			Self::OAuth10a => "1.0a",
			Self::OAuth20 => "2.0",
		}
	}

	/// Compact tag used inside store keys.
	pub fn tag(self) -> &'static str {
		match self {
			Self::OAuth10 => "oauth10",
			Self::OAuth10a => "oauth10a",
			Self::OAuth20 => "oauth20",
		}
	}
}
impl Display for ProtocolVersion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "OAuth {}", self.as_str())
	}
}

/// OAuth 2.0 grants used against the access-token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization Code exchange after the user grant.
	AuthorizationCode,
	/// Refresh Token grant replacing an expired access token.
	RefreshToken,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn versions_serialize_as_revision_labels() {
		assert_eq!(
			serde_json::to_string(&ProtocolVersion::OAuth10a).expect("Version should serialize."),
			"\"1.0a\""
		);
		assert_eq!(
			serde_json::from_str::<ProtocolVersion>("\"2.0\"").expect("Version should parse."),
			ProtocolVersion::OAuth20
		);
		assert!(ProtocolVersion::OAuth10.is_oauth1());
		assert!(!ProtocolVersion::OAuth20.is_oauth1());
	}
}

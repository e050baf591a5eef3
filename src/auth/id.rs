//! Strongly typed identifiers for provider descriptors and login services.
//!
//! Identifiers end up inside [`StoreKey`](crate::store::StoreKey)s and file-store snapshots,
//! so they are limited to ASCII letters, digits, `-`, `_`, and `.`.

// std
use std::{marker::PhantomData, ops::Deref};
// crates.io
use serde::{Deserializer, Serializer, de::Error as _};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 64;

/// Names the thing an [`Identifier`] identifies.
pub trait IdentifierKind {
	/// Label used in errors and `Debug` output.
	const LABEL: &'static str;
}

/// Marker for [`ProviderId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderKind {}
impl IdentifierKind for ProviderKind {
	const LABEL: &'static str = "Provider";
}

/// Marker for [`ServiceId`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceKind {}
impl IdentifierKind for ServiceKind {
	const LABEL: &'static str = "Service";
}

/// Identifier for an OAuth provider descriptor.
pub type ProviderId = Identifier<ProviderKind>;
/// Identifier for a configured external login service.
pub type ServiceId = Identifier<ServiceKind>;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier.
		kind: &'static str,
	},
	/// The identifier holds a character that is unsafe inside a store key.
	#[error("{kind} identifier contains the disallowed character {found:?}.")]
	InvalidCharacter {
		/// Kind of identifier.
		kind: &'static str,
		/// First offending character.
		found: char,
	},
	/// The identifier exceeded the allowed length.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier.
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
}

/// Validated identifier tagged with the kind `K`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier<K> {
	value: String,
	kind: PhantomData<K>,
}
impl<K> Identifier<K>
where
	K: IdentifierKind,
{
	/// Validates and wraps `value`.
	pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
		let value = value.into();
		let kind = K::LABEL;

		if value.is_empty() {
			return Err(IdentifierError::Empty { kind });
		}
		if value.len() > IDENTIFIER_MAX_LEN {
			return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
		}
		if let Some(found) =
			value.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
		{
			return Err(IdentifierError::InvalidCharacter { kind, found });
		}

		Ok(Self { value, kind: PhantomData })
	}
}
impl<K> Deref for Identifier<K> {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.value
	}
}
impl<K> AsRef<str> for Identifier<K> {
	fn as_ref(&self) -> &str {
		&self.value
	}
}
impl<K> Debug for Identifier<K>
where
	K: IdentifierKind,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}({})", K::LABEL, self.value)
	}
}
impl<K> Display for Identifier<K> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.value)
	}
}
impl<K> FromStr for Identifier<K>
where
	K: IdentifierKind,
{
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl<K> Serialize for Identifier<K> {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.value)
	}
}
impl<'de, K> Deserialize<'de> for Identifier<K>
where
	K: IdentifierKind,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Self::new(String::deserialize(deserializer)?).map_err(D::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn identifiers_stay_safe_inside_store_keys() {
		assert!(matches!(
			ProviderId::new("git hub"),
			Err(IdentifierError::InvalidCharacter { kind: "Provider", found: ' ' })
		));
		assert!(matches!(
			ServiceId::new("a/b"),
			Err(IdentifierError::InvalidCharacter { kind: "Service", found: '/' })
		));
		assert!(matches!(ServiceId::new(""), Err(IdentifierError::Empty { kind: "Service" })));
		assert!(matches!(
			ProviderId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)),
			Err(IdentifierError::TooLong { .. })
		));

		let provider =
			ProviderId::new("google.oauth2-v2_main").expect("Identifier should be valid.");

		assert_eq!(&*provider, "google.oauth2-v2_main");
		assert_eq!(format!("{provider:?}"), "Provider(google.oauth2-v2_main)");
	}

	#[test]
	fn deserialization_validates() {
		let service: ServiceId =
			serde_json::from_str("\"facebook\"").expect("Service should deserialize.");

		assert_eq!(service.to_string(), "facebook");
		assert_eq!(
			serde_json::to_string(&service).expect("Service should serialize."),
			"\"facebook\""
		);
		assert!(serde_json::from_str::<ServiceId>("\"with space\"").is_err());
	}
}

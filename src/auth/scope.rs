//! Scope modeling for OAuth 2.0 authorize URLs and OAuth 1.0 request-token calls.

// std
use std::collections::BTreeSet;
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Deduplicated, sorted set of scopes requested from a provider.
///
/// An empty set means "send no `scope` parameter at all".
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ScopeSet(Arc<[String]>);
impl ScopeSet {
	/// Creates a normalized scope set from any iterator.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut set = BTreeSet::new();

		for scope in scopes {
			let scope = scope.into();

			if scope.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if scope.chars().any(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope });
			}

			set.insert(scope);
		}

		Ok(Self(set.into_iter().collect()))
	}

	/// Splits a delimited scope string (as providers document them) into a set.
	pub fn parse(raw: &str, delimiter: char) -> Result<Self, ScopeValidationError> {
		Self::new(raw.split(delimiter).map(str::trim).filter(|scope| !scope.is_empty()))
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.binary_search_by(|candidate| candidate.as_str().cmp(scope)).is_ok()
	}

	/// Iterator over normalized scopes.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Joins the scopes with the provider's delimiter; `None` when empty.
	pub fn format(&self, delimiter: char) -> Option<String> {
		if self.is_empty() {
			return None;
		}

		let mut buf = String::new();

		for (idx, value) in self.iter().enumerate() {
			if idx > 0 {
				buf.push(delimiter);
			}

			buf.push_str(value);
		}

		Some(buf)
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_list().entries(self.iter()).finish()
	}
}
impl TryFrom<Vec<String>> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(value)
	}
}
impl From<ScopeSet> for Vec<String> {
	fn from(value: ScopeSet) -> Self {
		value.0.to_vec()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_are_sorted_and_deduplicated() {
		let scope = ScopeSet::new(["profile", "email", "profile"])
			.expect("Scope fixture should be valid.");

		assert_eq!(scope.len(), 2);
		assert!(scope.contains("email"));
		assert!(!scope.contains("openid"));
		assert_eq!(scope.format(' '), Some("email profile".into()));
		assert_eq!(scope.format(','), Some("email,profile".into()));
	}

	#[test]
	fn empty_set_formats_to_none() {
		assert_eq!(ScopeSet::default().format(' '), None);
		assert!(ScopeSet::parse("  ", ' ').expect("Blank scope string should parse.").is_empty());
	}

	#[test]
	fn invalid_entries_are_rejected() {
		assert_eq!(ScopeSet::new([""]), Err(ScopeValidationError::Empty));
		assert!(matches!(
			ScopeSet::new(["user read"]),
			Err(ScopeValidationError::ContainsWhitespace { .. })
		));
	}

	#[test]
	fn parse_honors_custom_delimiters() {
		let scope = ScopeSet::parse("read_stream,email", ',').expect("Comma scopes should parse.");

		assert_eq!(scope.iter().collect::<Vec<_>>(), ["email", "read_stream"]);
	}

	#[test]
	fn serde_validates_entries() {
		let scope: ScopeSet = serde_json::from_str("[\"b\",\"a\"]")
			.expect("Scope list should deserialize successfully.");

		assert_eq!(serde_json::to_string(&scope).expect("Scope should serialize."), "[\"a\",\"b\"]");
		assert!(serde_json::from_str::<ScopeSet>("[\"with space\"]").is_err());
	}
}

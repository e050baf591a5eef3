//! Profile normalization through dotted-path attribute tables.

// self
use crate::_prelude::*;

/// Normalized profile attributes: flat names mapped to string, number, or boolean values.
pub type Attributes = BTreeMap<String, Value>;

/// Declarative `normalized name → provider field path` table.
///
/// Paths are dotted (`location.name`); numeric segments index into arrays (`emails.0.value`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(BTreeMap<String, String>);
impl AttributeMap {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a mapping.
	pub fn with(mut self, normalized: impl Into<String>, path: impl Into<String>) -> Self {
		self.0.insert(normalized.into(), path.into());

		self
	}

	/// Returns `true` when no mapping is declared.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates `(normalized, path)` pairs.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(name, path)| (name.as_str(), path.as_str()))
	}

	/// Extracts attributes from a decoded profile.
	///
	/// Paths that are missing or resolve to null, objects, or arrays are skipped. An empty
	/// map copies the profile's top-level scalars unchanged.
	pub fn normalize(&self, profile: &Value) -> Attributes {
		if self.is_empty() {
			return profile
				.as_object()
				.map(|object| {
					object
						.iter()
						.filter(|(_, value)| is_scalar(value))
						.map(|(name, value)| (name.clone(), value.clone()))
						.collect()
				})
				.unwrap_or_default();
		}

		self.iter()
			.filter_map(|(name, path)| {
				let value = lookup(profile, path).filter(|value| is_scalar(value))?;

				Some((name.to_owned(), value.clone()))
			})
			.collect()
	}
}
impl<K, V> FromIterator<(K, V)> for AttributeMap
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

fn is_scalar(value: &Value) -> bool {
	matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
	path.split('.').try_fold(value, |current, segment| match current {
		Value::Object(object) => object.get(segment),
		Value::Array(items) => segment.parse::<usize>().ok().and_then(|idx| items.get(idx)),
		_ => None,
	})
}

/// Renders a scalar attribute as text.
pub fn attribute_text(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn profile() -> Value {
		json!({
			"id": 42,
			"login": "ada",
			"verified": true,
			"location": { "name": "London" },
			"emails": [{ "value": "ada@example.com" }],
			"friends": ["b", "c"],
			"bio": null
		})
	}

	#[test]
	fn dotted_paths_reach_nested_scalars() {
		let map = AttributeMap::new()
			.with("id", "id")
			.with("name", "login")
			.with("city", "location.name")
			.with("email", "emails.0.value")
			.with("friends", "friends")
			.with("bio", "bio")
			.with("missing", "nope.deeper");
		let attributes = map.normalize(&profile());

		assert_eq!(
			attributes,
			Attributes::from([
				("id".into(), json!(42)),
				("name".into(), json!("ada")),
				("city".into(), json!("London")),
				("email".into(), json!("ada@example.com")),
			])
		);
	}

	#[test]
	fn empty_map_copies_top_level_scalars() {
		let attributes = AttributeMap::new().normalize(&profile());

		assert_eq!(attributes.len(), 3);
		assert_eq!(attributes.get("verified"), Some(&json!(true)));
		assert!(!attributes.contains_key("location"));
	}

	#[test]
	fn maps_deserialize_from_configuration() {
		let map: AttributeMap = serde_json::from_value(json!({ "name": "display_name" }))
			.expect("Attribute map should deserialize.");

		assert_eq!(map.iter().collect::<Vec<_>>(), vec![("name", "display_name")]);
		assert_eq!(attribute_text(&json!(7)), Some("7".into()));
		assert_eq!(attribute_text(&json!([1])), None);
	}
}

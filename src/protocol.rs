//! RFC 3986 percent-encoding plus canonical query-string construction and parsing.
//!
//! OAuth 1.0 signatures are computed over a canonical form of every request parameter, so
//! the helpers here are deterministic: [`build_query_string`] encodes each name and value,
//! then orders the pairs by encoded name and, for repeated names, by encoded value.
//! [`parse_query_string`] is the inverse and keeps every value of a repeated name.

// std
use std::collections::btree_map::{self, Entry};
// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
// self
use crate::_prelude::*;

/// Everything except the RFC 3986 unreserved set (`ALPHA / DIGIT / "-" / "." / "_" / "~"`).
const UNRESERVED_SET: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes a string per RFC 3986 (space becomes `%20`, never `+`).
pub fn url_encode(value: &str) -> String {
	utf8_percent_encode(value, UNRESERVED_SET).to_string()
}

/// Decodes percent-escapes; invalid UTF-8 sequences are replaced lossily.
pub fn url_decode(value: &str) -> String {
	percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Builds the canonical `key=value&...` string for the provided parameters.
///
/// Pairs sort by their encoded bytes, not the raw ones, so `a/` (`a%2F`) precedes `a-`. OAuth
/// 1.0 signature base strings require this order.
pub fn build_query_string(params: &Params) -> String {
	let mut pairs = params
		.iter()
		.flat_map(|(key, values)| {
			let key = url_encode(key);

			values.iter().map(move |value| (key.clone(), url_encode(value)))
		})
		.collect::<Vec<_>>();

	pairs.sort();

	let mut buf = String::new();

	for (idx, (key, value)) in pairs.iter().enumerate() {
		if idx > 0 {
			buf.push('&');
		}

		buf.push_str(key);
		buf.push('=');
		buf.push_str(value);
	}

	buf
}

/// Parses a query string (a leading `?` is tolerated) into ordered parameters.
///
/// `+` is read as a space so form-encoded provider responses decode correctly.
pub fn parse_query_string(raw: &str) -> Params {
	let raw = raw.strip_prefix('?').unwrap_or(raw);
	let mut params = Params::new();

	for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
		let (key, value) = pair.split_once('=').unwrap_or((pair, ""));

		params.append(form_decode(key), form_decode(value));
	}

	params
}

fn form_decode(value: &str) -> String {
	url_decode(&value.replace('+', " "))
}

/// Request parameters where a name may carry several values.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, Vec<String>>);
impl Params {
	/// Creates an empty parameter set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder-style variant of [`insert`](Self::insert).
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.insert(key, value);

		self
	}

	/// Sets a single value, replacing any existing values for `key`.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.insert(key.into(), vec![value.into()]);
	}

	/// Sets a single value only when `key` is absent.
	pub fn insert_default(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.entry(key.into()).or_insert_with(|| vec![value.into()]);
	}

	/// Adds another value for `key`, keeping existing ones.
	pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
		match self.0.entry(key.into()) {
			Entry::Occupied(mut entry) => entry.get_mut().push(value.into()),
			Entry::Vacant(entry) => {
				entry.insert(vec![value.into()]);
			},
		}
	}

	/// First value for `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(|values| values.first()).map(String::as_str)
	}

	/// All values for `key` in insertion order.
	pub fn get_all(&self, key: &str) -> &[String] {
		self.0.get(key).map(Vec::as_slice).unwrap_or_default()
	}

	/// Returns true if `key` is present.
	pub fn contains_key(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	/// Removes `key`, returning its values.
	pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
		self.0.remove(key)
	}

	/// Moves every name from `other` into `self`; names present in both take `other`'s values.
	pub fn merge(&mut self, other: Params) {
		self.0.extend(other.0);
	}

	/// Splits the set in two: names matching `predicate` and the rest.
	pub fn partition(self, predicate: impl Fn(&str) -> bool) -> (Params, Params) {
		let (matched, rest) = self.0.into_iter().partition(|(key, _)| predicate(key.as_str()));

		(Params(matched), Params(rest))
	}

	/// Number of distinct names.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true when no parameters are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates names with their values, ordered by name.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
		self.0.iter().map(|(key, values)| (key.as_str(), values.as_slice()))
	}

	/// Converts the parameters into a JSON object; single values become strings.
	pub fn to_value(&self) -> Value {
		let map = self
			.0
			.iter()
			.map(|(key, values)| {
				let value = match values.as_slice() {
					[single] => Value::String(single.clone()),
					many => Value::Array(many.iter().cloned().map(Value::String).collect()),
				};

				(key.clone(), value)
			})
			.collect();

		Value::Object(map)
	}
}
impl Debug for Params {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_map().entries(self.0.iter()).finish()
	}
}
impl<K, V> FromIterator<(K, V)> for Params
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		let mut params = Params::new();

		for (key, value) in iter {
			params.append(key, value);
		}

		params
	}
}
impl IntoIterator for Params {
	type IntoIter = btree_map::IntoIter<String, Vec<String>>;
	type Item = (String, Vec<String>);

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn encoding_follows_rfc3986() {
		assert_eq!(url_encode("a b"), "a%20b");
		assert_eq!(url_encode("-_.~"), "-_.~");
		assert_eq!(url_encode("a+b=c&d"), "a%2Bb%3Dc%26d");
		assert_eq!(url_encode("http://example.com/"), "http%3A%2F%2Fexample.com%2F");
		assert_eq!(url_encode("é"), "%C3%A9");
	}

	#[test]
	fn decoding_reverses_encoding_over_reserved_and_unreserved_sets() {
		let samples = [
			"ABCxyz0129-._~",
			":/?#[]@!$&'()*+,;=",
			"spaces and %percent",
			"mixed é ü 漢字",
		];

		for sample in samples {
			assert_eq!(url_decode(&url_encode(sample)), sample);
		}

		assert_eq!(url_decode("a+b"), "a+b", "Plain decoding must not treat `+` as space.");
	}

	#[test]
	fn query_string_sorts_encoded_names() {
		let params = Params::from_iter([("a-", "1"), ("a/", "2")]);

		assert_eq!(build_query_string(&params), "a%2F=2&a-=1");
	}

	#[test]
	fn query_string_is_sorted_by_name_then_value() {
		let params = Params::from_iter([
			("z", "1"),
			("a", "2"),
			("multi", "b"),
			("multi", "a"),
			("c d", "e f"),
		]);

		assert_eq!(build_query_string(&params), "a=2&c%20d=e%20f&multi=a&multi=b&z=1");
	}

	#[test]
	fn parse_collects_repeated_keys() {
		let params = parse_query_string("?a=1&b=x+y&a=2&flag&c=%26");

		assert_eq!(params.get_all("a"), ["1".to_string(), "2".to_string()]);
		assert_eq!(params.get("b"), Some("x y"));
		assert_eq!(params.get("flag"), Some(""));
		assert_eq!(params.get("c"), Some("&"));
		assert!(parse_query_string("").is_empty());
	}

	#[test]
	fn build_parse_build_is_stable() {
		let params = Params::from_iter([
			("oauth_callback", "https://app.example.com/cb?x=1&y=2"),
			("scope", "read write"),
			("tags", "b"),
			("tags", "a"),
			("empty", ""),
			("unicode", "naïve ☃"),
		]);
		let first = build_query_string(&params);
		let second = build_query_string(&parse_query_string(&first));

		assert_eq!(first, second);
	}

	#[test]
	fn merge_overrides_and_partition_splits() {
		let mut params = Params::new().with("a", "1").with("b", "2");

		params.merge(Params::new().with("b", "3").with("c", "4"));

		assert_eq!(params.get("b"), Some("3"));

		let (oauth, rest) =
			params.with("oauth_token", "t").partition(|key| key.starts_with("oauth_"));

		assert_eq!(oauth.len(), 1);
		assert_eq!(rest.len(), 3);
	}

	#[test]
	fn to_value_collapses_single_values() {
		let value = Params::from_iter([("a", "1"), ("b", "x"), ("b", "y")]).to_value();

		assert_eq!(value, serde_json::json!({ "a": "1", "b": ["x", "y"] }));
	}
}

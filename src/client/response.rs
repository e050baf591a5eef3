//! Provider response decoding: JSON, URL-encoded forms, and XML into one JSON value.

// std
use std::mem;
// crates.io
use quick_xml::{Reader, events::Event};
use serde_json::Map;
// self
use crate::{_prelude::*, error::ProtocolError, protocol};

/// Body formats the drivers can decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentType {
	/// `application/json` (and `+json` variants).
	Json,
	/// `application/x-www-form-urlencoded`.
	UrlEncoded,
	/// `application/xml`, `text/xml`, and `+xml` variants.
	Xml,
}
impl ContentType {
	/// Maps a `Content-Type` header value; unrelated types (e.g. `text/plain`) yield `None`.
	pub fn from_header(value: &str) -> Option<Self> {
		let value = value.to_ascii_lowercase();

		if value.contains("json") {
			Some(Self::Json)
		} else if value.contains("x-www-form-urlencoded") {
			Some(Self::UrlEncoded)
		} else if value.contains("xml") {
			Some(Self::Xml)
		} else {
			None
		}
	}

	/// Guesses the format from the payload shape.
	///
	/// `{...}`/`[...]` is JSON, `<...>` is XML, and `k=v(&k=v)*` is a URL-encoded form.
	pub fn infer(body: &str) -> Option<Self> {
		let body = body.trim();

		if (body.starts_with('{') && body.ends_with('}'))
			|| (body.starts_with('[') && body.ends_with(']'))
		{
			return Some(Self::Json);
		}
		if body.starts_with('<') && body.ends_with('>') {
			return Some(Self::Xml);
		}
		if !body.is_empty() && body.split('&').all(is_form_pair) {
			return Some(Self::UrlEncoded);
		}

		None
	}

	/// Short label used in error messages.
	pub fn label(self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::UrlEncoded => "urlencoded",
			Self::Xml => "xml",
		}
	}
}

fn is_form_pair(pair: &str) -> bool {
	let valid = |part: &str| {
		!part.is_empty() && !part.contains(|c: char| matches!(c, '=' | '&') || c.is_whitespace())
	};

	match pair.split_once('=') {
		Some((key, value)) => valid(key) && valid(value),
		None => false,
	}
}

/// Decodes a raw provider body.
///
/// The header hint wins when it names a known format; otherwise the payload shape decides.
/// An empty body decodes to an empty object. A decoded object carrying an `error` field is
/// reported as [`ProtocolError::Provider`], never returned as a success value.
pub fn process_response(body: &[u8], content_type_hint: Option<&str>) -> Result<Value> {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return Ok(Value::Object(Map::new()));
	}

	let kind = content_type_hint
		.and_then(ContentType::from_header)
		.or_else(|| ContentType::infer(trimmed))
		.ok_or(ProtocolError::UnknownContentType)?;
	let value = match kind {
		ContentType::Json => serde_json::from_str(trimmed).map_err(|e| ProtocolError::Malformed {
			content_type: kind.label(),
			message: e.to_string(),
		})?,
		ContentType::UrlEncoded => protocol::parse_query_string(trimmed).to_value(),
		ContentType::Xml => decode_xml(trimmed)?,
	};

	if let Some(err) = provider_error(&value) {
		return Err(err.into());
	}

	Ok(value)
}

fn provider_error(value: &Value) -> Option<ProtocolError> {
	let object = value.as_object()?;
	let error = match object.get("error")? {
		Value::Null => return None,
		Value::String(code) => code.clone(),
		Value::Object(nested) => nested
			.get("type")
			.or_else(|| nested.get("code"))
			.or_else(|| nested.get("message"))
			.map(scalar_text)
			.unwrap_or_else(|| "error".into()),
		other => other.to_string(),
	};
	let description = ["error_description", "error_message", "message"]
		.iter()
		.find_map(|field| object.get(*field))
		.or_else(|| object.get("error").and_then(|nested| nested.get("message")))
		.map(scalar_text);

	Some(ProtocolError::Provider { error, description })
}

fn scalar_text(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}

struct XmlFrame {
	name: String,
	children: Map<String, Value>,
	text: String,
}
impl XmlFrame {
	fn new(name: String) -> Self {
		Self { name, children: Map::new(), text: String::new() }
	}

	fn into_value(self) -> Value {
		if self.children.is_empty() {
			Value::String(self.text.trim().to_owned())
		} else {
			Value::Object(self.children)
		}
	}
}

fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
	match children.get_mut(&name) {
		Some(Value::Array(items)) => items.push(value),
		Some(existing) => {
			let first = mem::take(existing);

			*existing = Value::Array(vec![first, value]);
		},
		None => {
			children.insert(name, value);
		},
	}
}

fn malformed_xml(message: impl Display) -> ProtocolError {
	ProtocolError::Malformed { content_type: ContentType::Xml.label(), message: message.to_string() }
}

// Elements become objects keyed by child name, leaves become strings, repeated siblings
// become arrays, and attributes are dropped. The root element itself is unwrapped.
fn decode_xml(body: &str) -> Result<Value, ProtocolError> {
	let mut reader = Reader::from_str(body);
	let mut stack: Vec<XmlFrame> = Vec::new();
	let mut root: Option<(String, Value)> = None;

	loop {
		match reader.read_event().map_err(malformed_xml)? {
			Event::Start(start) => {
				let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

				stack.push(XmlFrame::new(name));
			},
			Event::Empty(start) => {
				let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

				match stack.last_mut() {
					Some(parent) => insert_child(&mut parent.children, name, Value::String(String::new())),
					None => root = Some((name, Value::String(String::new()))),
				}
			},
			Event::Text(text) =>
				if let Some(frame) = stack.last_mut() {
					frame.text.push_str(&text.unescape().map_err(malformed_xml)?);
				},
			Event::CData(data) =>
				if let Some(frame) = stack.last_mut() {
					frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
				},
			Event::End(_) => {
				let frame = stack.pop().ok_or_else(|| malformed_xml("unbalanced closing tag"))?;
				let name = frame.name.clone();
				let value = frame.into_value();

				match stack.last_mut() {
					Some(parent) => insert_child(&mut parent.children, name, value),
					None => root = Some((name, value)),
				}
			},
			Event::Eof => break,
			_ => {},
		}
	}

	if !stack.is_empty() {
		return Err(malformed_xml("unexpected end of document"));
	}

	match root {
		Some((_, value @ Value::Object(_))) => Ok(value),
		Some((name, value)) => {
			let mut map = Map::new();

			map.insert(name, value);

			Ok(Value::Object(map))
		},
		None => Err(malformed_xml("document has no root element")),
	}
}

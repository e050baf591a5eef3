//! User identities derived from normalized profile attributes.

// self
use crate::{
	_prelude::*,
	auth::ServiceId,
	error::ProtocolError,
	service::{Attributes, attribute_text},
};

/// Identity a hosting application links to its local user record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
	/// Login service that vouched for the identity.
	pub service: ServiceId,
	/// Provider-scoped user identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Every normalized attribute.
	pub attributes: Attributes,
}
impl UserIdentity {
	/// Derives an identity from normalized attributes.
	///
	/// `id` is required. `name` falls back to `first_name` + `last_name`, then to the id.
	pub fn from_attributes(service: ServiceId, attributes: Attributes) -> Result<Self> {
		let text = |field: &str| {
			attributes
				.get(field)
				.and_then(attribute_text)
				.map(|value| value.trim().to_owned())
				.filter(|value| !value.is_empty())
		};
		let id = text("id").ok_or(ProtocolError::MissingField { field: "id" })?;
		let name = text("name")
			.or_else(|| {
				let parts = [text("first_name"), text("last_name")];
				let joined = parts.into_iter().flatten().collect::<Vec<_>>().join(" ");

				(!joined.is_empty()).then_some(joined)
			})
			.unwrap_or_else(|| id.clone());

		Ok(Self { service, id, name, attributes })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn service() -> ServiceId {
		ServiceId::new("github").expect("Service fixture should be valid.")
	}

	fn attributes(pairs: &[(&str, Value)]) -> Attributes {
		pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
	}

	#[test]
	fn direct_name_wins() {
		let identity = UserIdentity::from_attributes(
			service(),
			attributes(&[("id", json!(7)), ("name", json!("Ada L.")), ("first_name", json!("Ada"))]),
		)
		.expect("Identity should derive.");

		assert_eq!(identity.id, "7");
		assert_eq!(identity.name, "Ada L.");
	}

	#[test]
	fn name_falls_back_to_first_and_last_then_id() {
		let combined = UserIdentity::from_attributes(
			service(),
			attributes(&[
				("id", json!("u1")),
				("first_name", json!("Ada")),
				("last_name", json!("Lovelace")),
			]),
		)
		.expect("Identity should derive.");
		let first_only = UserIdentity::from_attributes(
			service(),
			attributes(&[("id", json!("u1")), ("first_name", json!("Ada"))]),
		)
		.expect("Identity should derive.");
		let bare = UserIdentity::from_attributes(service(), attributes(&[("id", json!("u1"))]))
			.expect("Identity should derive.");

		assert_eq!(combined.name, "Ada Lovelace");
		assert_eq!(first_only.name, "Ada");
		assert_eq!(bare.name, "u1");
	}

	#[test]
	fn missing_id_is_a_protocol_error() {
		let err = UserIdentity::from_attributes(service(), attributes(&[("name", json!("Ada"))]))
			.expect_err("Identity without id should fail.");

		assert!(matches!(err, Error::Protocol(ProtocolError::MissingField { field: "id" })));
	}
}

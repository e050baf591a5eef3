//! Durable key/value contract for cross-request flow state plus built-in backends.
//!
//! Redirect-driven flows span several inbound requests, so everything a driver must remember
//! between them (request tokens, anti-forgery state, attempt records, access tokens) goes
//! through a [`SessionStore`] under a deterministic [`StoreKey`].

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::ServiceId, provider::ProtocolVersion};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Session-scoped key/value store shared by every request participating in a flow.
///
/// Values are opaque strings; typed access goes through the helpers on `dyn SessionStore`.
/// No cross-key atomicity is required, and concurrent writers follow last-write-wins.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`.
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set<'a>(&'a self, key: &'a StoreKey, value: String) -> StoreFuture<'a, ()>;

	/// Removes `key`, returning the value it held.
	fn remove<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>>;
}
impl dyn SessionStore {
	/// Reads and decodes a JSON value.
	pub async fn load<T>(&self, key: &StoreKey) -> Result<Option<T>, StoreError>
	where
		T: DeserializeOwned,
	{
		self.get(key).await?.map(|raw| decode(key, &raw)).transpose()
	}

	/// Encodes and writes a JSON value.
	pub async fn save<T>(&self, key: &StoreKey, value: &T) -> Result<(), StoreError>
	where
		T: ?Sized + Serialize + Sync,
	{
		let raw = serde_json::to_string(value).map_err(|e| StoreError::Serialization {
			message: format!("Failed to encode {key}: {e}"),
		})?;

		self.set(key, raw).await
	}

	/// Removes a JSON value and decodes what it held.
	pub async fn take<T>(&self, key: &StoreKey) -> Result<Option<T>, StoreError>
	where
		T: DeserializeOwned,
	{
		self.remove(key).await?.map(|raw| decode(key, &raw)).transpose()
	}
}

fn decode<T>(key: &StoreKey, raw: &str) -> Result<T, StoreError>
where
	T: DeserializeOwned,
{
	serde_json::from_str(raw).map_err(|e| StoreError::Serialization {
		message: format!("Failed to decode {key}: {e}"),
	})
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Stored value could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Kind of value stored for a client or service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreSlot {
	/// Durable access token.
	Token,
	/// Pending OAuth 1.0 request token.
	RequestToken,
	/// OAuth 2.0 anti-forgery `state` value.
	AuthState,
	/// Persisted attempt record of a login service.
	Attempt,
}
impl StoreSlot {
	/// Stable label embedded in keys.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Token => "token",
			Self::RequestToken => "request_token",
			Self::AuthState => "auth_state",
			Self::Attempt => "attempt",
		}
	}
}

/// Deterministic key under which a value is stored.
///
/// Client keys combine the protocol, the client id, and a fingerprint of the authorize URL so
/// that several provider configurations can share one store without colliding.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreKey(String);
impl StoreKey {
	/// Key for a value owned by a protocol client.
	pub fn for_client(
		protocol: ProtocolVersion,
		client_id: &str,
		authorize_url: &Url,
		slot: StoreSlot,
	) -> Self {
		let digest = Sha256::digest(authorize_url.as_str().as_bytes());
		let fingerprint = URL_SAFE_NO_PAD.encode(digest);

		Self(format!("{}_{client_id}_{fingerprint}_{}", protocol.tag(), slot.as_str()))
	}

	/// Key for a value owned by a login service.
	pub fn for_service(service: &ServiceId, slot: StoreSlot) -> Self {
		Self(format!("service_{service}_{}", slot.as_str()))
	}

	/// Raw key string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "StoreKey({})", self.0)
	}
}
impl Display for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

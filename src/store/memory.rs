//! Thread-safe in-memory [`SessionStore`] for single-process hosts and tests.

// self
use crate::{
	_prelude::*,
	store::{SessionStore, StoreFuture, StoreKey},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, String>>>;

/// Process-local store; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Returns `true` if `key` holds a value.
	pub fn contains(&self, key: &StoreKey) -> bool {
		self.0.read().contains_key(key)
	}
}
impl SessionStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(key).cloned()) })
	}

	fn set<'a>(&'a self, key: &'a StoreKey, value: String) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key.to_owned(), value);

			Ok(())
		})
	}

	fn remove<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.write().remove(key)) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::ServiceId, store::StoreSlot};

	#[tokio::test]
	async fn clones_share_entries() {
		let store = MemoryStore::default();
		let shared = store.clone();
		let key = StoreKey::for_service(
			&ServiceId::new("twitter").expect("Service fixture should be valid."),
			StoreSlot::Attempt,
		);

		store.set(&key, "value".into()).await.expect("Set should succeed.");

		assert!(shared.contains(&key));
		assert_eq!(shared.len(), 1);
		assert_eq!(shared.remove(&key).await.expect("Remove should succeed."), Some("value".into()));
		assert!(store.is_empty());
	}
}

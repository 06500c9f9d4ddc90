//! Process-wide signing-key store shared by validator instances.

// std
use std::collections::HashMap;
// crates.io
use tokio::sync::RwLock;
// self
use crate::{_prelude::*, cache::key::SigningKey};

/// Thread-safe map from key identifier to signing key.
///
/// Cloning yields another handle to the same store. Entries never expire and are never evicted;
/// the last write for a key id wins. Reads never trigger network access.
#[derive(Clone, Debug, Default)]
pub struct KeyCache {
	keys: Arc<RwLock<HashMap<String, Arc<SigningKey>>>>,
}
impl KeyCache {
	/// Create an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Look up a key by identifier.
	pub async fn get(&self, kid: &str) -> Option<Arc<SigningKey>> {
		self.keys.read().await.get(kid).cloned()
	}

	/// Store a key under the given identifier, returning the entry it replaced.
	pub async fn insert(
		&self,
		kid: impl Into<String>,
		key: impl Into<Arc<SigningKey>>,
	) -> Option<Arc<SigningKey>> {
		self.keys.write().await.insert(kid.into(), key.into())
	}

	/// Store every key under its own identifier, returning how many entries were written.
	///
	/// Keys without an identifier are skipped.
	pub async fn insert_batch<I>(&self, keys: I) -> usize
	where
		I: IntoIterator<Item = SigningKey>,
	{
		let mut guard = self.keys.write().await;
		let mut written = 0;

		for key in keys {
			let Some(kid) = key.kid.clone() else {
				continue;
			};

			guard.insert(kid, Arc::new(key));

			written += 1;
		}

		written
	}

	/// Number of cached keys.
	pub async fn len(&self) -> usize {
		self.keys.read().await.len()
	}

	/// Whether the cache holds no keys.
	pub async fn is_empty(&self) -> bool {
		self.keys.read().await.is_empty()
	}
}

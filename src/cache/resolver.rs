//! Cache-first signing-key resolution.

// crates.io
use reqwest::Client;
use url::Url;
// self
use crate::{
	_prelude::*,
	cache::{
		key::{KeySet, SigningKey},
		store::KeyCache,
	},
	http::client::{self, FetchTarget},
	metrics::{self, ValidatorMetrics},
	options::ValidationOptions,
};

/// Resolves signing keys from the shared [`KeyCache`], fetching the provider key set on a miss.
#[derive(Clone, Debug)]
pub struct KeyResolver {
	client: Client,
	options: Arc<ValidationOptions>,
	cache: KeyCache,
	metrics: Arc<ValidatorMetrics>,
}
impl KeyResolver {
	/// Create a resolver backed by the given cache.
	pub fn new(
		client: Client,
		options: Arc<ValidationOptions>,
		cache: KeyCache,
		metrics: Arc<ValidatorMetrics>,
	) -> Self {
		Self { client, options, cache, metrics }
	}

	/// Cache backing this resolver.
	pub fn cache(&self) -> &KeyCache {
		&self.cache
	}

	/// Resolve the signing key for `kid`.
	///
	/// Returns `Ok(None)` without any network access when `kid` is absent. On a cache miss the
	/// full key set is fetched and every returned key is cached under its own id, so sibling keys
	/// from the same response resolve without another round trip. The result may still be `None`
	/// if the provider does not publish `kid`.
	#[tracing::instrument(
		skip(self, jwks_uri, kid, application_id),
		fields(tenant = %self.options.tenant_id, kid = kid.unwrap_or_default())
	)]
	pub async fn resolve(
		&self,
		jwks_uri: &Url,
		kid: Option<&str>,
		application_id: Option<&str>,
	) -> Result<Option<Arc<SigningKey>>> {
		let Some(kid) = kid else {
			tracing::debug!("token header carries no key id");

			return Ok(None);
		};

		if let Some(key) = self.cache.get(kid).await {
			tracing::debug!("signing key served from cache");

			self.observe_lookup(true);

			return Ok(Some(key));
		}

		self.observe_lookup(false);

		let url = key_set_url(jwks_uri, application_id);

		tracing::debug!(%url, "signing key not cached; fetching key set");

		// TODO: bound how many keys one response may add; only `max_response_bytes` limits it now.
		let key_set: KeySet =
			client::fetch_json(&self.client, &url, &self.options, FetchTarget::Keys)
				.await
				.map_err(|err| Error::KeyFetch {
					reason: client::failure_reason(&err, "Signing key request failed."),
					url: url.clone(),
				})?;
		let written = self.cache.insert_batch(key_set.keys).await;
		let key = self.cache.get(kid).await;

		tracing::debug!(written, found = key.is_some(), "key set cached");

		Ok(key)
	}

	fn observe_lookup(&self, hit: bool) {
		metrics::record_key_lookup(&self.options.tenant_id, hit);

		if hit {
			self.metrics.record_key_hit();
		} else {
			self.metrics.record_key_miss();
		}
	}
}

/// Key-set URL scoped to the calling application, when the token names one.
pub fn key_set_url(jwks_uri: &Url, application_id: Option<&str>) -> Url {
	let mut url = jwks_uri.clone();

	if let Some(application_id) = application_id {
		url.query_pairs_mut().append_pair("appid", application_id);
	}

	url
}

//! Identity provider discovery metadata, resolved once per validator.

// crates.io
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use url::Url;
// self
use crate::{
	_prelude::*,
	http::client::{self, FetchTarget},
	options::ValidationOptions,
};

/// Discovery document fields the validator relies on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetadata {
	/// Signing-key endpoint.
	pub jwks_uri: Url,
	/// Issuer advertised by the provider.
	#[serde(default)]
	pub issuer: Option<String>,
}

/// Lazily fetches the discovery document and memoizes it for the validator's lifetime.
///
/// The document is never refreshed once loaded. A failed fetch leaves nothing cached, so the
/// next call tries again.
#[derive(Clone, Debug)]
pub struct MetadataResolver {
	client: Client,
	options: Arc<ValidationOptions>,
	metadata: Arc<RwLock<Option<Arc<ProviderMetadata>>>>,
}
impl MetadataResolver {
	/// Create a resolver for the configured discovery document.
	pub fn new(client: Client, options: Arc<ValidationOptions>) -> Self {
		Self { client, options, metadata: Arc::new(RwLock::new(None)) }
	}

	/// Previously resolved metadata, if any.
	pub async fn cached(&self) -> Option<Arc<ProviderMetadata>> {
		self.metadata.read().await.clone()
	}

	/// Return the resolved metadata, fetching it on first use.
	///
	/// Concurrent first calls may each fetch; the last successful write is kept.
	#[tracing::instrument(skip(self), fields(tenant = %self.options.tenant_id))]
	pub async fn ensure_metadata(&self) -> Result<Arc<ProviderMetadata>> {
		if let Some(metadata) = self.cached().await {
			return Ok(metadata);
		}

		let url = &self.options.metadata_document_uri;

		tracing::debug!(%url, "metadata not yet resolved; fetching discovery document");

		let metadata: ProviderMetadata =
			client::fetch_json(&self.client, url, &self.options, FetchTarget::Metadata)
				.await
				.map_err(|err| Error::MetadataFetch {
					url: url.clone(),
					reason: client::failure_reason(&err, "Discovery document request failed."),
				})?;
		let metadata = Arc::new(metadata);

		*self.metadata.write().await = Some(metadata.clone());

		tracing::debug!(jwks_uri = %metadata.jwks_uri, "provider metadata resolved");

		Ok(metadata)
	}
}

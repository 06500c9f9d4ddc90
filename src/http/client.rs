//! HTTP client integration for discovery and signing-key retrieval.

// crates.io
use http::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;
// self
use crate::{_prelude::*, metrics, options::ValidationOptions, security};

/// Identity provider document kinds fetched by the validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchTarget {
	/// Discovery (OpenID configuration) document.
	Metadata,
	/// Signing-key set.
	Keys,
}
impl FetchTarget {
	/// Stable label used in logs and metrics.
	pub fn as_str(self) -> &'static str {
		match self {
			FetchTarget::Metadata => "metadata",
			FetchTarget::Keys => "keys",
		}
	}
}

/// Build the reqwest client used when the caller does not supply one.
pub fn default_client() -> Result<Client> {
	let client = Client::builder()
		.user_agent(format!("token-validator/{}", env!("CARGO_PKG_VERSION")))
		.connect_timeout(Duration::from_secs(5))
		.build()?;

	Ok(client)
}

/// Execute a GET request and decode the JSON body.
///
/// A single attempt is made; failures are returned to the caller untouched.
pub async fn fetch_json<T>(
	client: &Client,
	url: &Url,
	options: &ValidationOptions,
	target: FetchTarget,
) -> Result<T>
where
	T: DeserializeOwned,
{
	let start = Instant::now();
	let outcome = fetch_json_inner(client, url, options).await;
	let elapsed = start.elapsed();

	metrics::record_fetch(&options.tenant_id, target, outcome.is_ok(), elapsed);

	match &outcome {
		Ok(_) => tracing::debug!(
			target_kind = target.as_str(),
			url = %url,
			elapsed = ?elapsed,
			"identity provider fetch complete"
		),
		Err(err) => tracing::warn!(
			target_kind = target.as_str(),
			url = %url,
			error = %err,
			"identity provider fetch failed"
		),
	}

	outcome
}

async fn fetch_json_inner<T>(client: &Client, url: &Url, options: &ValidationOptions) -> Result<T>
where
	T: DeserializeOwned,
{
	if options.require_https {
		security::enforce_https(url)?;
	}

	let mut builder = client.get(url.clone()).header(ACCEPT, "application/json");

	if let Some(timeout) = options.request_timeout {
		builder = builder.timeout(timeout);
	}

	let response = builder.send().await?;
	let status = response.status();

	if !status.is_success() {
		let body = response.text().await.ok();

		return Err(Error::HttpStatus { status, url: url.clone(), body });
	}

	let bytes = response.bytes().await?;

	if bytes.len() as u64 > options.max_response_bytes {
		return Err(Error::ResponseTooLarge {
			url: url.clone(),
			size: bytes.len() as u64,
			limit: options.max_response_bytes,
		});
	}

	Ok(serde_json::from_slice(&bytes)?)
}

/// Normalize a transport failure into a single human-readable reason.
///
/// Prefers the upstream status and body, then the error's own message, then `fallback`.
pub fn failure_reason(err: &Error, fallback: &str) -> String {
	if let Error::HttpStatus { status, body: Some(body), .. } = err
		&& !body.trim().is_empty()
	{
		return format!("{status}: {body}");
	}

	let message = err.to_string();

	if message.trim().is_empty() { fallback.to_owned() } else { message }
}

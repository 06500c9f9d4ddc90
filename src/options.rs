//! Validator configuration and construction-time checks.
//!
//! [`ValidationOptions`] is immutable once handed to a [`TokenValidator`](crate::TokenValidator).
//! Required fields are checked when the validator is built, before any network activity.

// crates.io
use serde::{Deserialize, Serialize};
use url::Url;
// self
use crate::{_prelude::*, security};

/// Default size guard for discovery and key-set responses (1 MiB).
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 1_048_576;

/// Configuration describing which tokens a validator accepts.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOptions {
	/// Tenant identifier every accepted token must carry in its `tid` claim.
	pub tenant_id: String,
	/// Audience every accepted token must be issued for.
	pub audience: String,
	/// URL of the identity provider's discovery document.
	pub metadata_document_uri: Url,
	/// Application identifiers permitted to call the resource; empty allows any caller.
	#[serde(default)]
	pub allowed_application_ids: Vec<String>,
	/// Scopes every accepted token must grant; empty requires none.
	#[serde(default)]
	pub required_scopes: Vec<String>,
	/// Acceptable token issuers; `None` leaves the issuer unchecked.
	#[serde(default)]
	pub valid_issuers: Option<Vec<String>>,
	/// Per-request timeout for discovery and key fetches; `None` keeps the transport default.
	#[serde(default)]
	pub request_timeout: Option<Duration>,
	/// Whether identity provider endpoints must use HTTPS.
	#[serde(default = "default_true")]
	pub require_https: bool,
	/// Maximum size allowed for discovery and key-set payloads in bytes.
	#[serde(default = "default_max_response_bytes")]
	pub max_response_bytes: u64,
}
impl ValidationOptions {
	/// Construct options with the three required settings and defaults for everything else.
	pub fn new(
		tenant_id: impl Into<String>,
		audience: impl Into<String>,
		metadata_document_uri: impl AsRef<str>,
	) -> Result<Self> {
		let metadata_document_uri = Url::parse(metadata_document_uri.as_ref())?;

		Ok(Self {
			tenant_id: tenant_id.into(),
			audience: audience.into(),
			metadata_document_uri,
			allowed_application_ids: Vec::new(),
			required_scopes: Vec::new(),
			valid_issuers: None,
			request_timeout: None,
			require_https: true,
			max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
		})
	}

	/// Restrict accepted callers to the given application identifiers.
	pub fn with_allowed_application_ids<I, S>(mut self, ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.allowed_application_ids = ids.into_iter().map(Into::into).collect();

		self
	}

	/// Require every listed scope to be granted by the token.
	pub fn with_required_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.required_scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Restrict accepted tokens to the given issuers.
	pub fn with_valid_issuers<I, S>(mut self, issuers: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.valid_issuers = Some(issuers.into_iter().map(Into::into).collect());

		self
	}

	/// Bound each identity provider request by the given timeout.
	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Set HTTPS requirement to the desired value.
	pub fn with_require_https(mut self, require_https: bool) -> Self {
		self.require_https = require_https;

		self
	}

	/// Issuer allow-list to enforce, treating an empty list as unset.
	pub fn issuers(&self) -> Option<&[String]> {
		self.valid_issuers.as_deref().filter(|issuers| !issuers.is_empty())
	}

	/// Validate the options against the documented constraints.
	pub fn validate(&self) -> Result<()> {
		if self.tenant_id.trim().is_empty() {
			return Err(Error::Config { field: "tenant_id", reason: "Must not be empty.".into() });
		}
		if self.audience.trim().is_empty() {
			return Err(Error::Config { field: "audience", reason: "Must not be empty.".into() });
		}
		if self.require_https {
			security::enforce_https(&self.metadata_document_uri)?;
		}
		if self.metadata_document_uri.host_str().is_none() {
			return Err(Error::Config {
				field: "metadata_document_uri",
				reason: "Must include a host component.".into(),
			});
		}
		if self.max_response_bytes == 0 {
			return Err(Error::Config {
				field: "max_response_bytes",
				reason: "Must be greater than zero.".into(),
			});
		}
		if let Some(timeout) = self.request_timeout
			&& timeout.is_zero()
		{
			return Err(Error::Config {
				field: "request_timeout",
				reason: "Must be greater than zero when set.".into(),
			});
		}

		Ok(())
	}
}

fn default_true() -> bool {
	true
}

fn default_max_response_bytes() -> u64 {
	DEFAULT_MAX_RESPONSE_BYTES
}

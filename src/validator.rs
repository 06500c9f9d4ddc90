//! Token validation pipeline.
//!
//! A call to [`TokenValidator::validate`] runs metadata resolution, decoding, key resolution,
//! signature verification, and claim policies in that order. The first stage that rejects the
//! token ends the pipeline.

// crates.io
use reqwest::Client;
use serde::Serialize;
// self
use crate::{
	_prelude::*,
	cache::{resolver::KeyResolver, store::KeyCache},
	http::client,
	metadata::MetadataResolver,
	metrics::{self, RejectionStage, ValidatorMetrics, ValidatorMetricsSnapshot},
	options::ValidationOptions,
	policy::ClaimsPolicyEngine,
	stage::Stage,
	token::{self, DecodedToken},
	verify,
};

/// Rejection reported when the token cannot be decoded.
pub const UNDECODABLE_TOKEN: &str = "The access token could not be decoded";

/// Verdict for a single token.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
	/// Token exactly as supplied by the caller.
	pub token: String,
	/// Decoded header and claims; present whenever decoding succeeded, even if the token was
	/// later rejected.
	pub decoded: Option<DecodedToken>,
	/// Whether the token passed every stage.
	pub is_valid: bool,
	/// Reason for rejection; `None` for valid tokens.
	pub validation_message: Option<String>,
}
impl ValidationResult {
	fn accepted(token: &str, decoded: DecodedToken) -> Self {
		Self {
			token: token.to_owned(),
			decoded: Some(decoded),
			is_valid: true,
			validation_message: None,
		}
	}

	fn rejected(token: &str, decoded: Option<DecodedToken>, message: impl Into<String>) -> Self {
		Self {
			token: token.to_owned(),
			decoded,
			is_valid: false,
			validation_message: Some(message.into()),
		}
	}
}

/// Validates bearer tokens against one identity provider configuration.
///
/// Cloning is cheap and clones share the discovery metadata. Signing keys live in the
/// [`KeyCache`] handed in at construction, which can be shared with other validators.
#[derive(Clone, Debug)]
pub struct TokenValidator {
	options: Arc<ValidationOptions>,
	metadata: MetadataResolver,
	keys: KeyResolver,
	policy: Arc<ClaimsPolicyEngine>,
	metrics: Arc<ValidatorMetrics>,
}
impl TokenValidator {
	/// Build a validator with the default reqwest client.
	///
	/// Fails without touching the network when the options are invalid.
	pub fn new(options: ValidationOptions, key_cache: KeyCache) -> Result<Self> {
		options.validate()?;

		let client = client::default_client()?;

		Ok(Self::with_parts(options, key_cache, client))
	}

	/// Build a validator using the supplied HTTP client.
	pub fn with_client(
		options: ValidationOptions,
		key_cache: KeyCache,
		client: Client,
	) -> Result<Self> {
		options.validate()?;

		Ok(Self::with_parts(options, key_cache, client))
	}

	fn with_parts(options: ValidationOptions, key_cache: KeyCache, client: Client) -> Self {
		let options = Arc::new(options);
		let metrics = ValidatorMetrics::new();
		let policy = Arc::new(ClaimsPolicyEngine::from_options(&options));

		Self {
			metadata: MetadataResolver::new(client.clone(), options.clone()),
			keys: KeyResolver::new(client, options.clone(), key_cache, metrics.clone()),
			options,
			policy,
			metrics,
		}
	}

	/// Options this validator enforces.
	pub fn options(&self) -> &ValidationOptions {
		&self.options
	}

	/// Signing-key cache used by this validator.
	pub fn key_cache(&self) -> &KeyCache {
		self.keys.cache()
	}

	/// Discovery metadata resolver for this validator.
	pub fn metadata(&self) -> &MetadataResolver {
		&self.metadata
	}

	/// Point-in-time snapshot of this validator's counters.
	pub fn metrics(&self) -> ValidatorMetricsSnapshot {
		self.metrics.snapshot()
	}

	/// Validate an access token.
	///
	/// Problems with the token itself come back as an invalid [`ValidationResult`]. Failing to
	/// reach the identity provider, or a verification failure that is not about the token, is
	/// returned as an error.
	#[tracing::instrument(skip(self, access_token), fields(tenant = %self.options.tenant_id))]
	pub async fn validate(&self, access_token: &str) -> Result<ValidationResult> {
		let metadata = self.metadata.ensure_metadata().await?;
		let decoded = match token::decode(access_token) {
			Ok(decoded) => decoded,
			Err(err) => {
				tracing::debug!(error = %err, "access token could not be decoded");

				return Ok(self.reject(
					access_token,
					None,
					RejectionStage::Decode,
					UNDECODABLE_TOKEN,
				));
			},
		};
		let key = self
			.keys
			.resolve(&metadata.jwks_uri, decoded.key_id(), decoded.claims.application_id())
			.await?;
		let verdict =
			verify::verify_signature(access_token, &decoded.header, key.as_deref(), &self.options)?;

		if let Stage::Reject(message) = verdict {
			let stage = if message == verify::INVALID_KEY {
				RejectionStage::Key
			} else {
				RejectionStage::Signature
			};

			return Ok(self.reject(access_token, Some(decoded), stage, message));
		}
		if let Stage::Reject(message) = self.policy.evaluate(&decoded.claims) {
			return Ok(self.reject(access_token, Some(decoded), RejectionStage::Claims, message));
		}

		metrics::record_validation(&self.options.tenant_id, None);

		self.metrics.record_accepted();

		tracing::debug!(kid = decoded.key_id().unwrap_or_default(), "access token accepted");

		Ok(ValidationResult::accepted(access_token, decoded))
	}

	fn reject(
		&self,
		token: &str,
		decoded: Option<DecodedToken>,
		stage: RejectionStage,
		message: impl Into<String>,
	) -> ValidationResult {
		let message = message.into();

		metrics::record_validation(&self.options.tenant_id, Some(stage));

		self.metrics.record_rejected();

		tracing::debug!(stage = stage.as_str(), %message, "access token rejected");

		ValidationResult::rejected(token, decoded, message)
	}
}

//! Crate-wide error types and `Result` alias.
//!
//! Only operational failures travel through [`Error`]. A token that fails validation is not an
//! error; it is reported through [`ValidationResult`](crate::ValidationResult).

/// Library-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the token validator crate.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Jsonwebtoken(#[from] jsonwebtoken::errors::Error),
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	Serde(#[from] serde_json::Error),
	#[error(transparent)]
	Url(#[from] url::ParseError),

	#[error("Invalid configuration for {field}: {reason}")]
	Config { field: &'static str, reason: String },
	#[error("Upstream HTTP status {status} from {url}: {body:?}")]
	HttpStatus { status: http::StatusCode, url: url::Url, body: Option<String> },
	#[error("Failed to fetch signing keys from {url}: {reason}")]
	KeyFetch { url: url::Url, reason: String },
	#[error("Malformed token: {0}")]
	MalformedToken(String),
	#[error("Failed to fetch identity provider metadata from {url}: {reason}")]
	MetadataFetch { url: url::Url, reason: String },
	#[cfg(feature = "prometheus")]
	#[error("Metrics error: {0}")]
	Metrics(String),
	#[error("Response from {url} is {size} bytes, over the {limit}-byte limit")]
	ResponseTooLarge { url: url::Url, size: u64, limit: u64 },
	#[error("Security violation: {0}")]
	Security(String),
}

//! Transport guards applied to identity provider URLs.
//!
//! Discovery documents and key sets decide which keys are trusted, so both endpoints are
//! expected to be served over TLS unless the caller explicitly opts out.

// crates.io
use url::Url;
// self
use crate::_prelude::*;

/// Ensure the provided URL uses HTTPS.
pub fn enforce_https(url: &Url) -> Result<()> {
	if url.scheme() == "https" {
		Ok(())
	} else {
		Err(Error::Security(format!("Upstream URL {url} must use HTTPS.")))
	}
}

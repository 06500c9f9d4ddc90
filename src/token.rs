//! Unverified decoding of compact signed tokens.
//!
//! Nothing produced here is trusted until [`verify_signature`](crate::verify::verify_signature)
//! accepts the token.

// std
use std::collections::HashSet;
// crates.io
use base64::prelude::*;
use jsonwebtoken::Header;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Claim carrying the tenant identifier.
pub const CLAIM_TENANT_ID: &str = "tid";
/// Claim carrying the authorized party (client application) identifier.
pub const CLAIM_AUTHORIZED_PARTY: &str = "azp";
/// Legacy claim carrying the client application identifier.
pub const CLAIM_APP_ID: &str = "appid";
/// Claim carrying the space-delimited scope grant.
pub const CLAIM_SCOPE: &str = "scp";
/// Claim carrying the token issuer.
pub const CLAIM_ISSUER: &str = "iss";

/// Token split into its header, claims, and raw signature segment.
#[derive(Clone, Debug, Serialize)]
pub struct DecodedToken {
	/// JOSE header declaring the algorithm and key identifier.
	pub header: Header,
	/// Claim set carried in the payload.
	pub claims: Claims,
	/// Base64url signature segment, left encoded.
	pub signature: String,
}
impl DecodedToken {
	/// Key identifier declared in the header, if any.
	pub fn key_id(&self) -> Option<&str> {
		self.header.kid.as_deref()
	}
}

/// Claim set keyed by claim name, with typed accessors for the claims the validator inspects.
///
/// Unrecognised claims are retained and reachable through [`Claims::get`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);
impl Claims {
	/// Raw value of an arbitrary claim.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// Insert or replace a claim, returning the previous value.
	pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
		self.0.insert(name.into(), value)
	}

	/// Tenant identifier (`tid`).
	pub fn tenant_id(&self) -> Option<&str> {
		self.str_claim(CLAIM_TENANT_ID)
	}

	/// Authorized party (`azp`).
	pub fn authorized_party(&self) -> Option<&str> {
		self.str_claim(CLAIM_AUTHORIZED_PARTY)
	}

	/// Legacy application identifier (`appid`).
	pub fn app_id(&self) -> Option<&str> {
		self.str_claim(CLAIM_APP_ID)
	}

	/// Calling application, preferring `azp` over the legacy `appid`.
	pub fn application_id(&self) -> Option<&str> {
		self.authorized_party().or_else(|| self.app_id())
	}

	/// Raw scope string (`scp`).
	pub fn scope(&self) -> Option<&str> {
		self.str_claim(CLAIM_SCOPE)
	}

	/// Granted scopes; an absent or empty `scp` yields an empty set.
	pub fn scopes(&self) -> HashSet<&str> {
		self.scope()
			.map(|scope| scope.split(' ').filter(|s| !s.is_empty()).collect())
			.unwrap_or_default()
	}

	/// Token issuer (`iss`).
	pub fn issuer(&self) -> Option<&str> {
		self.str_claim(CLAIM_ISSUER)
	}

	fn str_claim(&self, name: &str) -> Option<&str> {
		self.0.get(name).and_then(Value::as_str)
	}
}
impl From<Map<String, Value>> for Claims {
	fn from(value: Map<String, Value>) -> Self {
		Self(value)
	}
}

/// Split a compact token and decode its header and payload without verifying anything.
pub fn decode(token: &str) -> Result<DecodedToken> {
	let mut segments = token.split('.');
	let (Some(header), Some(payload), Some(signature), None) =
		(segments.next(), segments.next(), segments.next(), segments.next())
	else {
		return Err(Error::MalformedToken("Expected three dot-separated segments.".into()));
	};

	if signature.is_empty() {
		return Err(Error::MalformedToken("Signature segment is empty.".into()));
	}

	let header: Header = decode_segment(header, "header")?;
	let claims: Claims = decode_segment(payload, "payload")?;

	Ok(DecodedToken { header, claims, signature: signature.to_owned() })
}

fn decode_segment<T>(segment: &str, name: &str) -> Result<T>
where
	T: DeserializeOwned,
{
	let bytes = BASE64_URL_SAFE_NO_PAD
		.decode(segment)
		.map_err(|err| Error::MalformedToken(format!("Invalid {name} encoding: {err}.")))?;

	Ok(serde_json::from_slice(&bytes)?)
}

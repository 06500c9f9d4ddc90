//! Signing keys as published by the identity provider's key-set endpoint.

// crates.io
use base64::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const DER_SEQUENCE: u8 = 0x30;
const MIN_CERTIFICATE_LEN: usize = 64;

/// Key material published by the identity provider, identified by its key id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SigningKey {
	/// Key identifier referenced by token headers; keys published without one cannot be resolved.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kid: Option<String>,
	/// Intended usage, typically `sig`.
	#[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
	pub usage: Option<String>,
	/// Certificate thumbprint advertised alongside the key.
	#[serde(default, rename = "x5t", skip_serializing_if = "Option::is_none")]
	pub thumbprint: Option<String>,
	/// Certificate chain (base64 DER) or raw secret values, leaf first.
	#[serde(default, rename = "x5c")]
	pub certificates: Vec<String>,
	/// Additional members the provider publishes, kept verbatim.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl SigningKey {
	/// Create a key with a single certificate or secret value.
	pub fn new(kid: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			kid: Some(kid.into()),
			usage: Some("sig".into()),
			thumbprint: None,
			certificates: vec![value.into()],
			extra: Map::new(),
		}
	}

	/// Leaf certificate or secret used for verification.
	pub fn primary_value(&self) -> Option<&str> {
		self.certificates.first().map(String::as_str)
	}

	/// Whether the key publishes public-key material rather than a shared secret.
	///
	/// A non-`oct` `kty`, or a leaf value that decodes to a DER sequence, marks the key as
	/// asymmetric. Such keys must never be used as HMAC secrets.
	pub fn is_asymmetric(&self) -> bool {
		if let Some(kty) = self.extra.get("kty").and_then(Value::as_str) {
			return kty != "oct";
		}

		self.primary_value().is_some_and(is_der_certificate)
	}
}

fn is_der_certificate(value: &str) -> bool {
	BASE64_STANDARD
		.decode(value.trim())
		.is_ok_and(|der| der.len() >= MIN_CERTIFICATE_LEN && der[0] == DER_SEQUENCE)
}

/// Key-set document returned by the signing-key endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySet {
	/// Keys currently published by the provider.
	#[serde(default)]
	pub keys: Vec<SigningKey>,
}

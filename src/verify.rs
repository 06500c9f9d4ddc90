//! Signature and standard-claim verification backed by `jsonwebtoken`.
//!
//! The verification profile is pinned to the single algorithm the token declares, the configured
//! audience, and (when configured) the acceptable issuers. The declared algorithm is only honoured
//! when it matches the key: certificates serve RS*/PS*, shared secrets serve HS*.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation, errors::ErrorKind};
// self
use crate::{
	_prelude::*, cache::key::SigningKey, options::ValidationOptions, stage::Stage, token::Claims,
};

/// Rejection reported when no usable signing key was resolved.
pub const INVALID_KEY: &str = "Invalid key";
/// Rejection reported when the declared algorithm does not fit the resolved key.
pub const INVALID_ALGORITHM: &str = "invalid algorithm";

const PEM_LINE_WIDTH: usize = 64;

/// Verify the token's signature and standard claims with the resolved key.
///
/// The declared algorithm must suit the key material: RSA algorithms need a certificate and HMAC
/// algorithms need a shared secret. Recognised verification failures are returned as
/// [`Stage::Reject`]; anything else (crypto backend failures) is an operational error.
pub fn verify_signature(
	token: &str,
	header: &Header,
	key: Option<&SigningKey>,
	options: &ValidationOptions,
) -> Result<Stage<()>> {
	let Some((key, value)) = key.and_then(|key| Some((key, key.primary_value()?))) else {
		return Ok(Stage::reject(INVALID_KEY));
	};
	let Some(decoding_key) = decoding_key(header.alg, key, value) else {
		tracing::debug!(alg = ?header.alg, kid = key.kid.as_deref(), "algorithm does not fit key");

		return Ok(Stage::reject(INVALID_ALGORITHM));
	};
	let validation = validation_profile(header.alg, options);

	match jsonwebtoken::decode::<Claims>(token, &decoding_key, &validation) {
		Ok(_) => Ok(Stage::Continue(())),
		Err(err) => match rejection_message(err.kind(), options) {
			Some(message) => {
				tracing::debug!(error = %err, %message, "token failed verification");

				Ok(Stage::Reject(message))
			},
			None => Err(err.into()),
		},
	}
}

/// Wrap a base64 DER certificate in PEM armour.
pub fn wrap_certificate(value: &str) -> String {
	let body = value.trim();
	let mut pem = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);

	pem.push_str("-----BEGIN CERTIFICATE-----\n");

	let chars: Vec<char> = body.chars().collect();

	for line in chars.chunks(PEM_LINE_WIDTH) {
		pem.extend(line);
		pem.push('\n');
	}

	pem.push_str("-----END CERTIFICATE-----\n");

	pem
}

fn is_rsa_family(alg: Algorithm) -> bool {
	matches!(
		alg,
		Algorithm::RS256
			| Algorithm::RS384
			| Algorithm::RS512
			| Algorithm::PS256
			| Algorithm::PS384
			| Algorithm::PS512
	)
}

fn is_hmac_family(alg: Algorithm) -> bool {
	matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

fn decoding_key(alg: Algorithm, key: &SigningKey, value: &str) -> Option<DecodingKey> {
	if is_rsa_family(alg) {
		return DecodingKey::from_rsa_pem(wrap_certificate(value).as_bytes())
			.inspect_err(|err| tracing::debug!(error = %err, "key value is not an RSA certificate"))
			.ok();
	}
	if is_hmac_family(alg) && !key.is_asymmetric() {
		return Some(DecodingKey::from_secret(value.as_bytes()));
	}

	None
}

fn validation_profile(alg: Algorithm, options: &ValidationOptions) -> Validation {
	let mut validation = Validation::new(alg);

	validation.set_audience(&[options.audience.as_str()]);

	if let Some(issuers) = options.issuers() {
		validation.set_issuer(issuers);
		validation.set_required_spec_claims(&["aud", "iss"]);
	} else {
		validation.set_required_spec_claims(&["aud"]);
	}

	validation
}

fn rejection_message(kind: &ErrorKind, options: &ValidationOptions) -> Option<String> {
	let message = match kind {
		ErrorKind::InvalidAudience =>
			format!("jwt audience invalid. expected: {}", options.audience),
		ErrorKind::InvalidIssuer => format!(
			"jwt issuer invalid. expected: {}",
			options.issuers().map(|issuers| issuers.join(", ")).unwrap_or_default()
		),
		ErrorKind::InvalidSignature => "invalid signature".into(),
		ErrorKind::ExpiredSignature => "jwt expired".into(),
		ErrorKind::ImmatureSignature => "jwt not active".into(),
		ErrorKind::InvalidAlgorithm
		| ErrorKind::InvalidKeyFormat
		| ErrorKind::InvalidRsaKey(_)
		| ErrorKind::InvalidEcdsaKey => INVALID_ALGORITHM.into(),
		ErrorKind::InvalidSubject => "jwt subject invalid".into(),
		ErrorKind::MissingRequiredClaim(claim) => format!("jwt missing required claim: {claim}"),
		ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) =>
			"jwt malformed".into(),
		_ => return None,
	};

	Some(message)
}

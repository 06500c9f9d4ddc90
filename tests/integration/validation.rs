// crates.io
use jsonwebtoken::Algorithm;
use serde_json::json;
use token_validator::{
	Error, KeyCache, TokenValidator, UNDECODABLE_TOKEN, ValidationOptions,
	policy::{APPLICATION_NOT_ALLOWED, SCOPES_MISSING, TENANT_MISMATCH},
	verify::{INVALID_ALGORITHM, INVALID_KEY},
};
use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};
// self
use crate::support::{self, AUDIENCE, DISCOVERY_PATH, KEYS, KEYS_PATH, RSA_KID, TENANT_ID};

#[tokio::test]
async fn invalid_options_fail_before_any_request() {
	support::init_tracing();

	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.respond_with(ResponseTemplate::new(200))
		.expect(0)
		.mount(&server)
		.await;

	let uri = format!("{}{DISCOVERY_PATH}", server.uri());
	let blank_tenant =
		ValidationOptions::new("  ", AUDIENCE, &uri).unwrap().with_require_https(false);
	let blank_audience =
		ValidationOptions::new(TENANT_ID, "", &uri).unwrap().with_require_https(false);

	assert!(matches!(
		TokenValidator::new(blank_tenant, KeyCache::new()),
		Err(Error::Config { field: "tenant_id", .. })
	));
	assert!(matches!(
		TokenValidator::new(blank_audience, KeyCache::new()),
		Err(Error::Config { field: "audience", .. })
	));

	server.verify().await;
}

#[tokio::test]
async fn plain_http_provider_is_refused_by_default() {
	let server = MockServer::start().await;
	let options =
		ValidationOptions::new(TENANT_ID, AUDIENCE, format!("{}{DISCOVERY_PATH}", server.uri()))
			.unwrap();

	assert!(matches!(
		TokenValidator::new(options, KeyCache::new()),
		Err(Error::Security(_))
	));
}

#[tokio::test]
async fn well_formed_token_is_accepted() {
	support::init_tracing();

	let server = support::start_provider().await;
	let validator = support::validator(
		support::options(&server)
			.with_allowed_application_ids([support::APPLICATION_ID])
			.with_required_scopes(["orders.read"]),
		KeyCache::new(),
	);
	let token = support::sign(Some(KEYS[0].0), &support::claims());
	let result = validator.validate(&token).await.expect("validation");

	assert!(result.is_valid, "unexpected rejection: {:?}", result.validation_message);
	assert_eq!(result.validation_message, None);
	assert_eq!(result.token, token);

	let decoded = result.decoded.expect("decoded token");

	assert_eq!(decoded.key_id(), Some(KEYS[0].0));
	assert_eq!(decoded.claims.tenant_id(), Some(TENANT_ID));

	let snapshot = validator.metrics();

	assert_eq!(snapshot.accepted, 1);
	assert_eq!(snapshot.rejected, 0);
}

#[tokio::test]
async fn missing_scope_is_rejected() {
	let server = support::start_provider().await;
	let validator = support::validator(
		support::options(&server).with_required_scopes(["orders.read", "orders.admin"]),
		KeyCache::new(),
	);
	let token = support::sign(Some(KEYS[0].0), &support::claims());
	let result = validator.validate(&token).await.expect("validation");

	assert!(!result.is_valid);
	assert_eq!(result.validation_message.as_deref(), Some(SCOPES_MISSING));
	assert!(result.decoded.is_some());
}

#[tokio::test]
async fn application_outside_allow_list_is_rejected() {
	let server = support::start_provider().await;
	let validator = support::validator(
		support::options(&server).with_allowed_application_ids(["some-other-app"]),
		KeyCache::new(),
	);
	let token = support::sign(Some(KEYS[0].0), &support::claims());
	let result = validator.validate(&token).await.expect("validation");

	assert_eq!(result.validation_message.as_deref(), Some(APPLICATION_NOT_ALLOWED));
}

#[tokio::test]
async fn audience_mismatch_names_expected_audience() {
	let server = support::start_provider().await;
	let validator = support::validator(support::options(&server), KeyCache::new());
	let mut claims = support::claims();

	claims["aud"] = json!("api://billing");

	let token = support::sign(Some(KEYS[1].0), &claims);
	let result = validator.validate(&token).await.expect("validation");

	assert!(!result.is_valid);
	assert_eq!(
		result.validation_message.as_deref(),
		Some("jwt audience invalid. expected: api://orders")
	);
}

#[tokio::test]
async fn first_failing_policy_wins() {
	let server = support::start_provider().await;
	let validator = support::validator(
		support::options(&server).with_required_scopes(["orders.admin"]),
		KeyCache::new(),
	);
	let mut claims = support::claims();

	claims["tid"] = json!("another-tenant");

	let token = support::sign(Some(KEYS[0].0), &claims);
	let result = validator.validate(&token).await.expect("validation");

	assert_eq!(result.validation_message.as_deref(), Some(TENANT_MISMATCH));
}

#[tokio::test]
async fn undecodable_token_is_rejected_after_metadata_resolution() {
	let server = support::start_provider().await;
	let validator = support::validator(support::options(&server), KeyCache::new());

	for token in ["not-a-token", "a.b", "header.payload.signature"] {
		let result = validator.validate(token).await.expect("validation");

		assert!(!result.is_valid);
		assert!(result.decoded.is_none());
		assert_eq!(result.validation_message.as_deref(), Some(UNDECODABLE_TOKEN));
	}

	assert_eq!(support::requests_to(&server, DISCOVERY_PATH).await, 1);
	assert_eq!(support::requests_to(&server, KEYS_PATH).await, 0);
}

#[tokio::test]
async fn unpublished_key_id_is_invalid_key() {
	let server = support::start_provider().await;
	let validator = support::validator(support::options(&server), KeyCache::new());
	let token = support::sign_with_secret(Some("retired-key"), &support::claims(), KEYS[0].1);
	let result = validator.validate(&token).await.expect("validation");

	assert!(!result.is_valid);
	assert_eq!(result.validation_message.as_deref(), Some(INVALID_KEY));
	assert_eq!(result.decoded.expect("decoded token").key_id(), Some("retired-key"));
}

#[tokio::test]
async fn token_without_key_id_is_invalid_key_without_key_fetch() {
	let server = support::start_provider().await;
	let validator = support::validator(support::options(&server), KeyCache::new());
	let token = support::sign(None, &support::claims());
	let result = validator.validate(&token).await.expect("validation");

	assert_eq!(result.validation_message.as_deref(), Some(INVALID_KEY));
	assert_eq!(support::requests_to(&server, KEYS_PATH).await, 0);
}

#[tokio::test]
async fn forged_signature_is_rejected() {
	let server = support::start_provider().await;
	let validator = support::validator(support::options(&server), KeyCache::new());
	let token = support::sign_with_secret(
		Some(KEYS[0].0),
		&support::claims(),
		"attacker-controlled-secret-value",
	);
	let result = validator.validate(&token).await.expect("validation");

	assert_eq!(result.validation_message.as_deref(), Some("invalid signature"));
}

#[tokio::test]
async fn rs256_token_verifies_against_published_certificate() {
	let server = MockServer::start().await;

	support::mount_discovery(&server).await;
	support::mount_certificate(&server).await;

	let validator = support::validator(
		support::options(&server).with_required_scopes(["orders.read"]),
		KeyCache::new(),
	);
	let token = support::sign_rs256(&support::claims());
	let result = validator.validate(&token).await.expect("validation");

	assert!(result.is_valid, "unexpected rejection: {:?}", result.validation_message);
	assert_eq!(result.decoded.expect("decoded token").key_id(), Some(RSA_KID));
}

#[tokio::test]
async fn hmac_token_keyed_with_published_certificate_is_refused() {
	let server = MockServer::start().await;

	support::mount_discovery(&server).await;
	support::mount_certificate(&server).await;

	let validator = support::validator(support::options(&server), KeyCache::new());
	let token =
		support::sign_with_secret(Some(RSA_KID), &support::claims(), &support::certificate_body());
	let result = validator.validate(&token).await.expect("validation");

	assert!(!result.is_valid);
	assert_eq!(result.validation_message.as_deref(), Some(INVALID_ALGORITHM));
}

#[tokio::test]
async fn algorithm_the_key_cannot_serve_is_a_rejection() {
	let server = support::start_provider().await;
	let validator = support::validator(support::options(&server), KeyCache::new());

	for alg in [Algorithm::ES256, Algorithm::EdDSA, Algorithm::RS256] {
		let token = support::unsigned(alg, KEYS[0].0, &support::claims());
		let result = validator
			.validate(&token)
			.await
			.unwrap_or_else(|err| panic!("{alg:?} should not be fatal: {err:?}"));

		assert_eq!(result.validation_message.as_deref(), Some(INVALID_ALGORITHM), "{alg:?}");
	}
}

#[tokio::test]
async fn unreachable_metadata_is_an_error() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.respond_with(ResponseTemplate::new(500).set_body_string("discovery unavailable"))
		.mount(&server)
		.await;

	let validator = support::validator(support::options(&server), KeyCache::new());
	let token = support::sign(Some(KEYS[0].0), &support::claims());

	match validator.validate(&token).await {
		Err(Error::MetadataFetch { reason, .. }) =>
			assert_eq!(reason, "500 Internal Server Error: discovery unavailable"),
		other => panic!("expected metadata fetch error, got {other:?}"),
	}
}

#[tokio::test]
async fn unreachable_key_set_is_an_error() {
	let server = MockServer::start().await;

	support::mount_discovery(&server).await;

	let validator = support::validator(support::options(&server), KeyCache::new());
	let token = support::sign(Some(KEYS[0].0), &support::claims());

	assert!(matches!(validator.validate(&token).await, Err(Error::KeyFetch { .. })));
	assert!(validator.key_cache().is_empty().await);
}

#[tokio::test]
async fn metadata_is_resolved_once_per_validator() {
	let server = support::start_provider().await;
	let validator = support::validator(support::options(&server), KeyCache::new());

	for (kid, _) in KEYS {
		let token = support::sign(Some(kid), &support::claims());

		assert!(validator.validate(&token).await.expect("validation").is_valid);
	}

	assert_eq!(support::requests_to(&server, DISCOVERY_PATH).await, 1);
	assert!(validator.metadata().cached().await.is_some());
}

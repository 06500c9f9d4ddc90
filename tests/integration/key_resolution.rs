// crates.io
use token_validator::KeyCache;
// self
use crate::support::{self, DISCOVERY_PATH, KEYS, KEYS_PATH};

#[tokio::test]
async fn repeated_key_id_is_fetched_once() {
	support::init_tracing();

	let server = support::start_provider().await;
	let validator = support::validator(support::options(&server), KeyCache::new());
	let token = support::sign(Some(KEYS[0].0), &support::claims());

	for _ in 0..3 {
		assert!(validator.validate(&token).await.expect("validation").is_valid);
	}

	assert_eq!(support::requests_to(&server, KEYS_PATH).await, 1);

	let snapshot = validator.metrics();

	assert_eq!(snapshot.key_cache_misses, 1);
	assert_eq!(snapshot.key_cache_hits, 2);
}

#[tokio::test]
async fn whole_key_set_is_cached_from_one_response() {
	let server = support::start_provider().await;
	let cache = KeyCache::new();
	let validator = support::validator(support::options(&server), cache.clone());
	let first = support::sign(Some(KEYS[2].0), &support::claims());

	assert!(validator.validate(&first).await.expect("validation").is_valid);
	assert_eq!(cache.len().await, KEYS.len());

	for (kid, _) in &KEYS[..2] {
		let token = support::sign(Some(*kid), &support::claims());

		assert!(validator.validate(&token).await.expect("validation").is_valid);
	}

	assert_eq!(support::requests_to(&server, KEYS_PATH).await, 1);
}

#[tokio::test]
async fn validators_sharing_a_cache_share_fetched_keys() {
	let server = support::start_provider().await;
	let cache = KeyCache::new();
	let first = support::validator(support::options(&server), cache.clone());
	let second = support::validator(
		support::options(&server).with_required_scopes(["orders.write"]),
		cache.clone(),
	);
	let token = support::sign(Some(KEYS[1].0), &support::claims());

	assert!(first.validate(&token).await.expect("validation").is_valid);
	assert!(second.validate(&token).await.expect("validation").is_valid);

	// Each validator resolves its own metadata, but the key set is fetched once.
	assert_eq!(support::requests_to(&server, DISCOVERY_PATH).await, 2);
	assert_eq!(support::requests_to(&server, KEYS_PATH).await, 1);
	assert_eq!(second.metrics().key_cache_hits, 1);
}

#[tokio::test]
async fn independent_caches_fetch_independently() {
	let server = support::start_provider().await;
	let first = support::validator(support::options(&server), KeyCache::new());
	let second = support::validator(support::options(&server), KeyCache::new());
	let token = support::sign(Some(KEYS[0].0), &support::claims());

	assert!(first.validate(&token).await.expect("validation").is_valid);
	assert!(second.validate(&token).await.expect("validation").is_valid);
	assert_eq!(support::requests_to(&server, KEYS_PATH).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_validations_agree() {
	let server = support::start_provider().await;
	let validator = support::validator(support::options(&server), KeyCache::new());
	let tasks: Vec<_> = (0..16)
		.map(|i| {
			let validator = validator.clone();
			let token = support::sign(Some(KEYS[i % KEYS.len()].0), &support::claims());

			tokio::spawn(async move { validator.validate(&token).await })
		})
		.collect();

	for task in tasks {
		let result = task.await.expect("task").expect("validation");

		assert!(result.is_valid, "unexpected rejection: {:?}", result.validation_message);
	}

	assert_eq!(validator.key_cache().len().await, KEYS.len());
	assert!(support::requests_to(&server, KEYS_PATH).await >= 1);
	assert_eq!(validator.metrics().accepted, 16);
}

//! Metrics helpers and per-validator telemetry bookkeeping.

// std
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "prometheus")] use std::sync::OnceLock;
// crates.io
use metrics::Label;
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use smallvec::SmallVec;
// self
use crate::{_prelude::*, http::client::FetchTarget};

type LabelSet = SmallVec<[Label; 4]>;

const METRIC_VALIDATIONS_TOTAL: &str = "token_validator_validations_total";
const METRIC_REJECTIONS_TOTAL: &str = "token_validator_rejections_total";
const METRIC_KEY_CACHE_HITS: &str = "token_validator_key_cache_hits_total";
const METRIC_KEY_CACHE_MISSES: &str = "token_validator_key_cache_misses_total";
const METRIC_FETCH_TOTAL: &str = "token_validator_fetch_total";
const METRIC_FETCH_DURATION: &str = "token_validator_fetch_duration_seconds";

/// Shared Prometheus handle installed by [`install_default_exporter`].
#[cfg(feature = "prometheus")]
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Pipeline stage that rejected a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionStage {
	/// The token could not be decoded.
	Decode,
	/// No signing key could be resolved.
	Key,
	/// Signature or standard claim verification failed.
	Signature,
	/// A claims policy rule failed.
	Claims,
}
impl RejectionStage {
	/// Stable label used in logs and metrics.
	pub fn as_str(self) -> &'static str {
		match self {
			RejectionStage::Decode => "decode",
			RejectionStage::Key => "key",
			RejectionStage::Signature => "signature",
			RejectionStage::Claims => "claims",
		}
	}
}

/// Thread-safe metrics accumulator for a single validator.
#[derive(Debug, Default)]
pub struct ValidatorMetrics {
	validations: AtomicU64,
	accepted: AtomicU64,
	rejected: AtomicU64,
	key_cache_hits: AtomicU64,
	key_cache_misses: AtomicU64,
}
impl ValidatorMetrics {
	/// Create a new metrics accumulator.
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Record an accepted token.
	pub fn record_accepted(&self) {
		self.validations.fetch_add(1, Ordering::Relaxed);
		self.accepted.fetch_add(1, Ordering::Relaxed);
	}

	/// Record a rejected token.
	pub fn record_rejected(&self) {
		self.validations.fetch_add(1, Ordering::Relaxed);
		self.rejected.fetch_add(1, Ordering::Relaxed);
	}

	/// Record a key lookup served from the cache.
	pub fn record_key_hit(&self) {
		self.key_cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	/// Record a key lookup that required a key-set fetch.
	pub fn record_key_miss(&self) {
		self.key_cache_misses.fetch_add(1, Ordering::Relaxed);
	}

	/// Take a point-in-time snapshot.
	pub fn snapshot(&self) -> ValidatorMetricsSnapshot {
		ValidatorMetricsSnapshot {
			validations: self.validations.load(Ordering::Relaxed),
			accepted: self.accepted.load(Ordering::Relaxed),
			rejected: self.rejected.load(Ordering::Relaxed),
			key_cache_hits: self.key_cache_hits.load(Ordering::Relaxed),
			key_cache_misses: self.key_cache_misses.load(Ordering::Relaxed),
		}
	}
}

/// Read-only snapshot of per-validator counters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatorMetricsSnapshot {
	/// Validations that produced a result.
	pub validations: u64,
	/// Tokens accepted.
	pub accepted: u64,
	/// Tokens rejected.
	pub rejected: u64,
	/// Key lookups served from the cache.
	pub key_cache_hits: u64,
	/// Key lookups that fetched the key set.
	pub key_cache_misses: u64,
}
impl ValidatorMetricsSnapshot {
	/// Ratio of cache hits over all key lookups.
	pub fn key_hit_rate(&self) -> f64 {
		let total = self.key_cache_hits + self.key_cache_misses;

		if total == 0 { 0.0 } else { self.key_cache_hits as f64 / total as f64 }
	}
}

/// Install the default Prometheus recorder backed by `metrics`.
///
/// Multiple invocations are safe; subsequent calls become no-ops once the recorder is installed.
#[cfg(feature = "prometheus")]
pub fn install_default_exporter() -> Result<()> {
	if PROMETHEUS_HANDLE.get().is_some() {
		return Ok(());
	}

	let handle = PrometheusBuilder::new()
		.install_recorder()
		.map_err(|err| Error::Metrics(err.to_string()))?;
	let _ = PROMETHEUS_HANDLE.set(handle);

	Ok(())
}

/// Access the global Prometheus exporter handle when installed.
#[cfg(feature = "prometheus")]
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
	PROMETHEUS_HANDLE.get()
}

/// Record the verdict of a validation.
pub fn record_validation(tenant: &str, rejected_at: Option<RejectionStage>) {
	let outcome = if rejected_at.is_some() { "invalid" } else { "valid" };

	metrics::counter!(METRIC_VALIDATIONS_TOTAL, extend(tenant, "outcome", outcome).iter())
		.increment(1);

	if let Some(stage) = rejected_at {
		metrics::counter!(METRIC_REJECTIONS_TOTAL, extend(tenant, "stage", stage.as_str()).iter())
			.increment(1);
	}
}

/// Record a key lookup, tagging whether it was served from the cache.
pub fn record_key_lookup(tenant: &str, hit: bool) {
	let name = if hit { METRIC_KEY_CACHE_HITS } else { METRIC_KEY_CACHE_MISSES };

	metrics::counter!(name, base_labels(tenant).iter()).increment(1);
}

/// Record an identity provider fetch along with its latency.
pub fn record_fetch(tenant: &str, target: FetchTarget, success: bool, duration: Duration) {
	let status = if success { "success" } else { "error" };
	let mut labels = extend(tenant, "target", target.as_str());

	metrics::histogram!(METRIC_FETCH_DURATION, labels.iter()).record(duration.as_secs_f64());

	labels.push(Label::new("status", status));

	metrics::counter!(METRIC_FETCH_TOTAL, labels.iter()).increment(1);
}

fn base_labels(tenant: &str) -> LabelSet {
	let mut labels = LabelSet::with_capacity(3);

	labels.push(Label::new("tenant", tenant.to_owned()));

	labels
}

fn extend(tenant: &str, key: &'static str, value: &'static str) -> LabelSet {
	let mut labels = base_labels(tenant);

	labels.push(Label::new(key, value));

	labels
}

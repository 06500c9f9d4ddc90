//! Async bearer-token validator: discovery metadata, a shared signing-key cache, signature
//! verification, and ordered claim policies behind a single `validate` call.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod http;
pub mod metadata;
pub mod metrics;
pub mod options;
pub mod policy;
pub mod security;
pub mod stage;
pub mod token;
pub mod verify;

mod error;
mod validator;
mod _prelude {
	pub use std::{sync::Arc, time::Duration};

	pub use tokio::time::Instant;

	pub use crate::{Error, Result};
}

#[cfg(feature = "prometheus")] pub use crate::metrics::install_default_exporter;
pub use crate::{
	cache::{key::SigningKey, store::KeyCache},
	error::{Error, Result},
	metadata::ProviderMetadata,
	options::ValidationOptions,
	validator::{TokenValidator, UNDECODABLE_TOKEN, ValidationResult},
};

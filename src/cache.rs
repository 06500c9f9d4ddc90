//! Signing-key model, the shared key cache, and cache-backed key resolution.

pub mod key;
pub mod resolver;
pub mod store;

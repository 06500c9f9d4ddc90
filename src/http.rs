//! HTTP helpers for identity provider document retrieval.

pub mod client;

//! Ordered claim rules applied after the signature has been verified.
//!
//! Rules run strictly in insertion order and evaluation stops at the first failure, so the
//! reported message always belongs to the earliest failing rule.

// std
use std::fmt::{Debug, Formatter, Result as FmtResult};
// self
use crate::{_prelude::*, options::ValidationOptions, stage::Stage, token::Claims};

/// Failure message of the tenant rule.
pub const TENANT_MISMATCH: &str = "tenantId does not match";
/// Failure message of the application allow-list rule.
pub const APPLICATION_NOT_ALLOWED: &str = "authenticated applicationId not in allowed list";
/// Failure message of the required-scopes rule.
pub const SCOPES_MISSING: &str = "required scopes missing";

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Named predicate paired with the message reported when it fails.
pub struct ValidationRule<T> {
	name: &'static str,
	predicate: Predicate<T>,
	message: &'static str,
}
impl<T> ValidationRule<T> {
	/// Build a rule from a predicate and its fixed failure message.
	pub fn new<F>(name: &'static str, message: &'static str, predicate: F) -> Self
	where
		F: Fn(&T) -> bool + Send + Sync + 'static,
	{
		Self { name, predicate: Box::new(predicate), message }
	}

	/// Rule name.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Message reported when the rule fails.
	pub fn message(&self) -> &'static str {
		self.message
	}

	/// Whether `input` satisfies the rule.
	pub fn check(&self, input: &T) -> bool {
		(self.predicate)(input)
	}
}
impl<T> Debug for ValidationRule<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.debug_struct("ValidationRule")
			.field("name", &self.name)
			.field("message", &self.message)
			.finish_non_exhaustive()
	}
}

/// Ordered rule list evaluated against decoded claims.
#[derive(Debug)]
pub struct ClaimsPolicyEngine {
	rules: Vec<ValidationRule<Claims>>,
}
impl ClaimsPolicyEngine {
	/// Build the tenant, application, and scope rules, in that order, from the options.
	pub fn from_options(options: &ValidationOptions) -> Self {
		let tenant_id = options.tenant_id.clone();
		let allowed: Arc<[String]> = options.allowed_application_ids.clone().into();
		let required: Arc<[String]> = options.required_scopes.clone().into();

		Self {
			rules: vec![
				ValidationRule::new("tenant", TENANT_MISMATCH, move |claims: &Claims| {
					claims.tenant_id() == Some(tenant_id.as_str())
				}),
				ValidationRule::new("application", APPLICATION_NOT_ALLOWED, move |claims: &Claims| {
					allowed.is_empty()
						|| claims
							.application_id()
							.is_some_and(|app| allowed.iter().any(|candidate| candidate == app))
				}),
				ValidationRule::new("scopes", SCOPES_MISSING, move |claims: &Claims| {
					if required.is_empty() {
						return true;
					}

					let granted = claims.scopes();

					required.iter().all(|scope| granted.contains(scope.as_str()))
				}),
			],
		}
	}

	/// Rule names in evaluation order.
	pub fn rules(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.rules.iter().map(ValidationRule::name)
	}

	/// Evaluate every rule in order, stopping at the first failure.
	pub fn evaluate(&self, claims: &Claims) -> Stage<()> {
		for rule in &self.rules {
			if !rule.check(claims) {
				tracing::debug!(rule = rule.name(), "claims rule failed");

				return Stage::reject(rule.message());
			}
		}

		Stage::Continue(())
	}
}

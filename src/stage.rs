//! Outcome of a single validation pipeline stage.
//!
//! Stages return `Result<Stage<T>>`: `Ok(Stage::Continue)` hands a value to the next stage,
//! `Ok(Stage::Reject)` ends the pipeline with an invalid verdict, and `Err` is an operational
//! failure that aborts the call.

/// Verdict of one pipeline stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stage<T> {
	/// The stage passed and produced a value for the next one.
	Continue(T),
	/// The token was rejected with a human-readable reason.
	Reject(String),
}
impl<T> Stage<T> {
	/// Reject with the given reason.
	pub fn reject(message: impl Into<String>) -> Self {
		Self::Reject(message.into())
	}

	/// Whether the stage passed.
	pub fn is_continue(&self) -> bool {
		matches!(self, Self::Continue(_))
	}

	/// Rejection reason, if the stage rejected.
	pub fn message(&self) -> Option<&str> {
		match self {
			Self::Continue(_) => None,
			Self::Reject(message) => Some(message),
		}
	}
}

//! Hooks invoked around every backend call.

use std::time::Duration;

use crate::{BackendError, ParamBag, Query, ResultSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallKind {
	Search { offset: usize, limit: usize },
	Retrieve { id: String },
}

/// An outgoing backend call. Hooks may rewrite the query and params but not the target or kind.
#[derive(Debug, Clone)]
pub struct BackendCall {
	target: String,
	kind: CallKind,
	pub query: Query,
	pub params: ParamBag,
}
impl BackendCall {
	pub fn new(target: impl Into<String>, kind: CallKind, query: Query, params: ParamBag) -> Self {
		Self { target: target.into(), kind, query, params }
	}

	pub fn target(&self) -> &str {
		&self.target
	}

	pub fn kind(&self) -> &CallKind {
		&self.kind
	}
}

#[derive(Debug, Clone, Copy)]
pub enum CallOutcome<'a> {
	Completed(&'a ResultSet),
	Failed(&'a BackendError),
}

pub trait LifecycleHook
where
	Self: Send + Sync,
{
	fn before_call(&self, _call: &mut BackendCall) {}

	fn after_call(&self, _call: &BackendCall, _outcome: CallOutcome<'_>, _elapsed: Duration) {}
}

/// Logs every backend call at debug level and failures at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHook;
impl LifecycleHook for TracingHook {
	fn after_call(&self, call: &BackendCall, outcome: CallOutcome<'_>, elapsed: Duration) {
		let elapsed_ms = elapsed.as_millis() as u64;

		match (call.kind(), outcome) {
			(CallKind::Search { offset, limit }, CallOutcome::Completed(set)) => tracing::debug!(
				backend_id = %call.target(),
				offset,
				limit,
				records = set.len(),
				total = set.total,
				elapsed_ms,
				"Backend search completed."
			),
			(CallKind::Retrieve { id }, CallOutcome::Completed(set)) => tracing::debug!(
				backend_id = %call.target(),
				record_id = %id,
				records = set.len(),
				elapsed_ms,
				"Backend retrieve completed."
			),
			(kind, CallOutcome::Failed(error)) => tracing::warn!(
				backend_id = %call.target(),
				kind = ?kind,
				error = %error,
				elapsed_ms,
				"Backend call failed."
			),
		}
	}
}

use std::{
	sync::Arc,
	time::{Duration, Instant},
};

use crate::{
	BackendError, BackendResult, CallKind, CallOutcome, LifecycleHook, ParamBag, Query, ResultSet,
	SearchBackend, hooks::BackendCall,
};

/// Runs backend calls through the hook chain under a per-call timeout.
#[derive(Clone)]
pub(crate) struct Dispatcher {
	hooks: Vec<Arc<dyn LifecycleHook>>,
	timeout: Duration,
}
impl Dispatcher {
	pub(crate) fn new(timeout: Duration) -> Self {
		Self { hooks: Vec::new(), timeout }
	}

	pub(crate) fn push_hook(&mut self, hook: Arc<dyn LifecycleHook>) {
		self.hooks.push(hook);
	}

	pub(crate) async fn call(
		&self,
		target: &str,
		backend: &dyn SearchBackend,
		kind: CallKind,
		query: &Query,
		params: &ParamBag,
	) -> BackendResult<ResultSet> {
		let mut call = BackendCall::new(target, kind, query.clone(), params.clone());

		for hook in &self.hooks {
			hook.before_call(&mut call);
		}

		let started = Instant::now();
		let result = self.execute(backend, &call).await;
		let elapsed = started.elapsed();
		let outcome = match &result {
			Ok(set) => CallOutcome::Completed(set),
			Err(err) => CallOutcome::Failed(err),
		};

		for hook in &self.hooks {
			hook.after_call(&call, outcome, elapsed);
		}

		result
	}

	async fn execute(&self, backend: &dyn SearchBackend, call: &BackendCall) -> BackendResult<ResultSet> {
		let future = match call.kind() {
			CallKind::Search { offset, limit } =>
				backend.search(&call.query, *offset, *limit, &call.params),
			CallKind::Retrieve { id } => backend.retrieve(id, &call.params),
		};

		match tokio::time::timeout(self.timeout, future).await {
			Ok(result) => result,
			Err(_) => Err(BackendError::Timeout { timeout_ms: self.timeout.as_millis() as u64 }),
		}
	}
}

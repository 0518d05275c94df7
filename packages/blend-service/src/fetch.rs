use std::sync::Arc;

use tokio::task::JoinSet;

use crate::{
	BackendError, BackendResult, CallKind, ParamBag, Query, ResultSet, SearchBackend,
	dispatch::Dispatcher,
};

/// One active backend with the query and params it receives.
#[derive(Clone)]
pub(crate) struct BackendTarget {
	pub(crate) id: String,
	pub(crate) label: String,
	pub(crate) backend: Arc<dyn SearchBackend>,
	pub(crate) query: Query,
	pub(crate) params: ParamBag,
}

#[derive(Debug, Clone)]
pub(crate) struct BackendFailure {
	pub(crate) backend_id: String,
	pub(crate) label: String,
	pub(crate) error: BackendError,
}

pub(crate) enum FetchOutcome {
	/// At least one backend answered. Lanes keep declared order.
	Collected { lanes: Vec<(BackendTarget, ResultSet)>, failures: Vec<BackendFailure> },
	/// Every backend failed. Holds the first failure in declared order.
	AllFailed(BackendFailure),
}

/// Records requested from each backend up front. Deep pages and count-only requests skip the
/// prefetch and rely on on-demand pages.
pub(crate) fn fetch_limit(offset: usize, limit: usize, blend_limit: usize) -> usize {
	if limit > 0 && offset <= blend_limit { blend_limit } else { 0 }
}

/// Issues one `search(query, 0, limit)` per target concurrently.
pub(crate) async fn fetch_bounded(
	dispatcher: &Dispatcher,
	targets: Vec<BackendTarget>,
	limit: usize,
) -> FetchOutcome {
	let mut tasks = JoinSet::new();

	for (index, target) in targets.iter().enumerate() {
		let dispatcher = dispatcher.clone();
		let id = target.id.clone();
		let backend = target.backend.clone();
		let query = target.query.clone();
		let params = target.params.clone();

		tasks.spawn(async move {
			let result = dispatcher
				.call(&id, backend.as_ref(), CallKind::Search { offset: 0, limit }, &query, &params)
				.await;

			(index, result)
		});
	}

	let mut results: Vec<Option<BackendResult<ResultSet>>> = targets.iter().map(|_| None).collect();

	while let Some(joined) = tasks.join_next().await {
		match joined {
			Ok((index, result)) => results[index] = Some(result),
			Err(err) => tracing::error!(error = %err, "Backend fetch task ended without a result."),
		}
	}

	let mut lanes = Vec::new();
	let mut failures = Vec::new();

	for (target, result) in targets.into_iter().zip(results) {
		let result = result.unwrap_or_else(|| {
			Err(BackendError::TaskFailed { message: "Fetch task was aborted.".to_string() })
		});

		match result {
			Ok(set) => lanes.push((target, set)),
			Err(error) => {
				tracing::warn!(backend_id = %target.id, error = %error, "Backend search failed.");

				failures.push(BackendFailure { backend_id: target.id, label: target.label, error });
			},
		}
	}

	if lanes.is_empty() && !failures.is_empty() {
		return FetchOutcome::AllFailed(failures.swap_remove(0));
	}

	FetchOutcome::Collected { lanes, failures }
}

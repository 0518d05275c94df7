//! In-memory backends for exercising the blender without network I/O.

use std::{
	sync::{Arc, Mutex},
	time::Duration,
};

use serde_json::json;

use blend_domain::{ParamBag, Query, RawRecord, ResultSet};
use blend_service::{
	BackendError, BackendRegistry, BackendResult, BlendSettings, Blender, BoxFuture, SearchBackend,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
	Search { query: Query, offset: usize, limit: usize, params: ParamBag },
	Retrieve { id: String, params: ParamBag },
}

/// A backend that serves a fixed record list and logs every call it receives.
pub struct ScriptedBackend {
	id: String,
	label: String,
	records: Vec<RawRecord>,
	total: Option<usize>,
	errors: Vec<String>,
	facets: Vec<(String, Vec<(String, usize)>)>,
	/// Fail every search from this zero-based call index on.
	fail_from: Option<(usize, BackendError)>,
	delay: Option<Duration>,
	calls: Mutex<Vec<RecordedCall>>,
}
impl ScriptedBackend {
	pub fn new(id: impl Into<String>) -> Self {
		let id = id.into();

		Self {
			label: id.clone(),
			id,
			records: Vec::new(),
			total: None,
			errors: Vec::new(),
			facets: Vec::new(),
			fail_from: None,
			delay: None,
			calls: Mutex::new(Vec::new()),
		}
	}

	/// Serves `count` records with ids `{id}1..={id}{count}`.
	pub fn with_records(mut self, count: usize) -> Self {
		self.records = (1..=count)
			.map(|n| {
				let record_id = format!("{}{n}", self.id);
				let title = format!("{} record {n}", self.label);
				let payload = json!({ "id": record_id.as_str(), "title": title });

				RawRecord::new(&self.id, record_id, payload)
			})
			.collect();

		self
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();

		self
	}

	/// Reports `total` regardless of how many records are actually served.
	pub fn with_total(mut self, total: usize) -> Self {
		self.total = Some(total);

		self
	}

	/// Attaches `message` to every successful search response.
	pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
		self.errors.push(message.into());

		self
	}

	/// Reports `counts` for `field` with every successful search response.
	pub fn with_facet(mut self, field: impl Into<String>, counts: &[(&str, usize)]) -> Self {
		let counts = counts.iter().map(|(value, count)| (value.to_string(), *count)).collect();

		self.facets.push((field.into(), counts));

		self
	}

	pub fn with_delay(mut self, delay: Duration) -> Self {
		self.delay = Some(delay);

		self
	}

	pub fn failing(self, error: BackendError) -> Self {
		self.failing_from(0, error)
	}

	pub fn failing_from(mut self, call_index: usize, error: BackendError) -> Self {
		self.fail_from = Some((call_index, error));

		self
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn into_arc(self) -> Arc<Self> {
		Arc::new(self)
	}

	pub fn calls(&self) -> Vec<RecordedCall> {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	/// `(offset, limit)` of every search call in arrival order.
	pub fn search_calls(&self) -> Vec<(usize, usize)> {
		self.calls()
			.into_iter()
			.filter_map(|call| match call {
				RecordedCall::Search { offset, limit, .. } => Some((offset, limit)),
				RecordedCall::Retrieve { .. } => None,
			})
			.collect()
	}

	pub fn call_count(&self) -> usize {
		self.calls.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	fn record(&self, call: RecordedCall) -> usize {
		let mut calls = self.calls.lock().unwrap_or_else(|err| err.into_inner());
		let index = calls.iter().filter(|call| matches!(call, RecordedCall::Search { .. })).count();

		calls.push(call);

		index
	}

	fn scripted_failure(&self, search_index: usize) -> Option<BackendError> {
		match &self.fail_from {
			Some((from, error)) if search_index >= *from => Some(error.clone()),
			_ => None,
		}
	}
}
impl SearchBackend for ScriptedBackend {
	fn search<'a>(
		&'a self,
		query: &'a Query,
		offset: usize,
		limit: usize,
		params: &'a ParamBag,
	) -> BoxFuture<'a, BackendResult<ResultSet>> {
		Box::pin(async move {
			let search_index = self.record(RecordedCall::Search {
				query: query.clone(),
				offset,
				limit,
				params: params.clone(),
			});

			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			if let Some(error) = self.scripted_failure(search_index) {
				return Err(error);
			}

			let records = self.records.iter().skip(offset).take(limit).cloned().collect::<Vec<_>>();
			let total = self.total.unwrap_or(self.records.len());
			let mut set = ResultSet::new(&self.id, records, total);

			for message in &self.errors {
				set = set.with_error(message.clone());
			}
			for (field, counts) in &self.facets {
				set = set.with_facet(field.as_str(), counts.clone());
			}

			Ok(set)
		})
	}

	fn retrieve<'a>(
		&'a self,
		id: &'a str,
		params: &'a ParamBag,
	) -> BoxFuture<'a, BackendResult<ResultSet>> {
		Box::pin(async move {
			self.record(RecordedCall::Retrieve { id: id.to_string(), params: params.clone() });

			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}
			if let Some((_, error)) = &self.fail_from {
				return Err(error.clone());
			}

			let records =
				self.records.iter().filter(|record| record.id == id).cloned().collect::<Vec<_>>();
			let total = records.len();

			Ok(ResultSet::new(&self.id, records, total))
		})
	}
}

/// Registry over `backends` in the given order, each registered under its own id and label.
pub fn registry(backends: &[Arc<ScriptedBackend>]) -> BackendRegistry {
	let mut registry = BackendRegistry::new();

	for backend in backends {
		let id = backend.id().to_string();
		let label = backend.label().to_string();

		if let Err(err) = registry.register(id, label, backend.clone()) {
			panic!("Failed to register scripted backend: {err}.");
		}
	}

	registry
}

pub fn blender(backends: &[Arc<ScriptedBackend>], settings: BlendSettings) -> Blender {
	match Blender::new(Arc::new(registry(backends)), settings) {
		Ok(blender) => blender,
		Err(err) => panic!("Failed to build blender: {err}."),
	}
}

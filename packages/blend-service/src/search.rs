use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
	BackendCount, Blender, Error, MergedWindow, ParamBag, Query, Result, Warning,
	facets,
	fetch::{self, BackendTarget, FetchOutcome},
	merge::MergeEngine,
	resolver,
	warnings::Warnings,
};

/// Query and params prepared for one backend ahead of blending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendInput {
	pub query: Query,
	pub params: ParamBag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query: Query,
	pub offset: usize,
	pub limit: usize,
	pub params: ParamBag,
	/// Per-backend overrides keyed by backend id. Backends without an entry receive the shared
	/// query and the cleaned request params.
	#[serde(default)]
	pub backend_inputs: BTreeMap<String, BackendInput>,
}
impl SearchRequest {
	pub fn new(query: Query, offset: usize, limit: usize) -> Self {
		Self { query, offset, limit, ..Default::default() }
	}

	pub fn with_params(mut self, params: ParamBag) -> Self {
		self.params = params;

		self
	}

	pub fn with_backend_input(mut self, backend_id: impl Into<String>, input: BackendInput) -> Self {
		self.backend_inputs.insert(backend_id.into(), input);

		self
	}
}

impl Blender {
	/// Returns positions `[offset, offset + limit)` of the blended result list.
	///
	/// Fails only when the backend filter names an unknown backend or when every active backend
	/// fails the initial fetch. Other backend failures are reported as warnings.
	pub async fn search(&self, req: SearchRequest) -> Result<MergedWindow> {
		let resolved = resolver::resolve_active_backends(
			&self.registry,
			&req.params,
			self.settings.facet_delimiter.as_deref(),
		)?;

		if resolved.active.is_empty() {
			return Ok(MergedWindow::slice(
				Vec::new(),
				req.offset,
				req.limit,
				0,
				Vec::new(),
				self.backend_counts(&[]),
			));
		}

		let targets = resolved
			.active
			.iter()
			.filter_map(|id| self.registry.get(id))
			.map(|registered| {
				let input = req.backend_inputs.get(&registered.id);

				BackendTarget {
					id: registered.id.clone(),
					label: registered.label.clone(),
					backend: registered.backend.clone(),
					query: input.map(|input| input.query.clone()).unwrap_or_else(|| req.query.clone()),
					params: input
						.map(|input| input.params.clone())
						.unwrap_or_else(|| resolved.params.clone()),
				}
			})
			.collect::<Vec<_>>();
		let fetch_limit = fetch::fetch_limit(req.offset, req.limit, self.settings.blend_limit());
		let (lanes, mut failures) =
			match fetch::fetch_bounded(&self.dispatcher, targets, fetch_limit).await {
				FetchOutcome::Collected { lanes, failures } => (lanes, failures),
				FetchOutcome::AllFailed(failure) =>
					return Err(Error::Backend { backend_id: failure.backend_id, source: failure.error }),
			};
		let totals = lanes.iter().map(|(target, set)| (target.id.clone(), set.total)).collect::<Vec<_>>();
		let total = totals.iter().map(|(_, total)| total).sum::<usize>();
		let block_size = self.settings.block_size_for(total);
		let facets = facets::merge_facets(
			&self.settings.facet_fields,
			lanes.iter().map(|(target, set)| (target.id.as_str(), set)),
		);
		let mut engine =
			MergeEngine::new(&self.dispatcher, lanes, block_size, &self.settings.initial_results);

		engine.seed(fetch_limit);

		let end = if req.limit == 0 { 0 } else { req.offset.saturating_add(req.limit) };

		if engine.placed_len() < end {
			engine.replay();
			engine.fill(end).await;
		}

		let output = engine.finish();
		let mut warnings = Warnings::default();

		failures.extend(output.failures);
		warnings.push_partial_failure(failures.into_iter().map(|failure| failure.label).collect());

		for message in output.messages {
			warnings.push(Warning::BackendMessage {
				backend_id: message.backend_id,
				label: message.label,
				message: message.message,
			});
		}

		tracing::debug!(
			offset = req.offset,
			limit = req.limit,
			total,
			block_size,
			placed = output.placed.len(),
			"Blended search completed."
		);

		Ok(MergedWindow::slice(
			output.placed,
			req.offset,
			req.limit,
			total,
			warnings.into_vec(),
			self.backend_counts(&totals),
		)
		.with_facets(facets))
	}

	/// Pseudo-facet counts for every registered backend in declared order.
	fn backend_counts(&self, totals: &[(String, usize)]) -> Vec<BackendCount> {
		let delimiter = self.settings.facet_delimiter.as_deref();

		self.registry
			.iter()
			.map(|registered| {
				let count = totals
					.iter()
					.find(|(id, _)| *id == registered.id)
					.map(|(_, total)| *total)
					.unwrap_or(0);
				let value = match delimiter {
					Some(delimiter) => format!("{}{delimiter}{}", registered.id, registered.label),
					None => registered.id.clone(),
				};

				BackendCount {
					backend_id: registered.id.clone(),
					value,
					label: registered.label.clone(),
					count,
				}
			})
			.collect()
	}
}

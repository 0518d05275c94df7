use serde::Serialize;

use crate::{RawRecord, Warning, facets::FacetCounts};

/// Source identifier of every blended window.
pub const BLENDER_SOURCE_ID: &str = "Blender";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowEntry {
	/// Absolute position in the virtual merged list.
	pub position: usize,
	pub backend_id: String,
	pub record: RawRecord,
}

/// Pseudo-facet count for one configured backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendCount {
	pub backend_id: String,
	/// `id`, or `id<delimiter>label` when a facet delimiter is configured.
	pub value: String,
	pub label: String,
	pub count: usize,
}

/// The caller's `[offset, offset + limit)` slice of the merged list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedWindow {
	pub source_id: String,
	pub total: usize,
	pub offset: usize,
	pub entries: Vec<WindowEntry>,
	pub warnings: Vec<Warning>,
	pub backend_counts: Vec<BackendCount>,
	/// Configured facets merged from the initial per-backend results.
	pub facets: FacetCounts,
}
impl MergedWindow {
	pub(crate) fn slice(
		placed: Vec<RawRecord>,
		offset: usize,
		limit: usize,
		total: usize,
		warnings: Vec<Warning>,
		backend_counts: Vec<BackendCount>,
	) -> Self {
		let entries = placed
			.into_iter()
			.enumerate()
			.skip(offset)
			.take(limit)
			.map(|(position, record)| WindowEntry {
				position,
				backend_id: record.backend_id.clone(),
				record,
			})
			.collect();

		Self {
			source_id: BLENDER_SOURCE_ID.to_string(),
			total,
			offset,
			entries,
			warnings,
			backend_counts,
			facets: FacetCounts::new(),
		}
	}

	pub(crate) fn with_facets(mut self, facets: FacetCounts) -> Self {
		self.facets = facets;

		self
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn record_ids(&self) -> Vec<&str> {
		self.entries.iter().map(|entry| entry.record.id.as_str()).collect()
	}
}

use std::{collections::BTreeMap, time::Duration};

use blend_config::{AdaptiveBlockSize, Config, FacetField, MIN_BLEND_LIMIT};

#[derive(Debug, Clone)]
pub struct BlendSettings {
	pub block_size: usize,
	/// Backend ids preferred for the leading positions, in order.
	pub initial_results: Vec<String>,
	pub backend_timeout: Duration,
	pub adaptive_block_sizes: Vec<AdaptiveBlockSize>,
	pub facet_delimiter: Option<String>,
	/// Facet fields merged across backends, keyed by blended name.
	pub facet_fields: BTreeMap<String, FacetField>,
}
impl BlendSettings {
	pub fn from_config(cfg: &Config) -> Self {
		Self {
			block_size: cfg.blending.block_size as usize,
			initial_results: cfg.blending.initial_results.clone(),
			backend_timeout: Duration::from_millis(cfg.blending.backend_timeout_ms),
			adaptive_block_sizes: cfg.blending.adaptive_block_sizes.clone(),
			facet_delimiter: cfg.facets.delimiter.clone(),
			facet_fields: cfg.facets.fields.clone(),
		}
	}

	pub fn with_block_size(mut self, block_size: usize) -> Self {
		self.block_size = block_size;

		self
	}

	pub fn with_initial_results<I, S>(mut self, ids: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.initial_results = ids.into_iter().map(Into::into).collect();

		self
	}

	pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
		self.backend_timeout = timeout;

		self
	}

	pub fn with_adaptive_block_size(mut self, range: AdaptiveBlockSize) -> Self {
		self.adaptive_block_sizes.push(range);

		self
	}

	pub fn with_facet_delimiter(mut self, delimiter: impl Into<String>) -> Self {
		self.facet_delimiter = Some(delimiter.into());

		self
	}

	pub fn with_facet_field(mut self, name: impl Into<String>, field: FacetField) -> Self {
		self.facet_fields.insert(name.into(), field);

		self
	}

	/// Records requested from each backend by the bounded fetch.
	pub fn blend_limit(&self) -> usize {
		(MIN_BLEND_LIMIT as usize).max(self.initial_results.len())
	}

	/// Block size for a combined total. The first matching adaptive range wins.
	pub fn block_size_for(&self, total: usize) -> usize {
		let total = total as u64;

		self.adaptive_block_sizes
			.iter()
			.find(|range| range.min_total <= total && total <= range.max_total)
			.map(|range| range.block_size as usize)
			.unwrap_or(self.block_size)
	}

	pub fn backend_timeout_ms(&self) -> u64 {
		self.backend_timeout.as_millis() as u64
	}
}
impl Default for BlendSettings {
	fn default() -> Self {
		Self {
			block_size: 10,
			initial_results: Vec::new(),
			backend_timeout: Duration::from_secs(10),
			adaptive_block_sizes: Vec::new(),
			facet_delimiter: None,
			facet_fields: BTreeMap::new(),
		}
	}
}

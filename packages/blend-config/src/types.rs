use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Floor for the number of records eagerly fetched from each backend.
pub const MIN_BLEND_LIMIT: u32 = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub blending: Blending,
	#[serde(default)]
	pub facets: Facets,
	/// Declaration order is the blending order.
	pub backends: Vec<BackendConfig>,
}
impl Config {
	/// Enabled backends in declared order.
	pub fn enabled_backends(&self) -> impl Iterator<Item = &BackendConfig> {
		self.backends.iter().filter(|backend| backend.enabled)
	}

	pub fn backend(&self, id: &str) -> Option<&BackendConfig> {
		self.enabled_backends().find(|backend| backend.id == id)
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Blending {
	pub block_size: u32,
	/// Backend ids for the leading, pinned result slots.
	pub initial_results: Vec<String>,
	pub backend_timeout_ms: u64,
	pub adaptive_block_sizes: Vec<AdaptiveBlockSize>,
}
impl Default for Blending {
	fn default() -> Self {
		Self {
			block_size: 10,
			initial_results: Vec::new(),
			backend_timeout_ms: 10_000,
			adaptive_block_sizes: Vec::new(),
		}
	}
}

/// Block size override applied when the combined total falls in `min_total..=max_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AdaptiveBlockSize {
	pub min_total: u64,
	pub max_total: u64,
	pub block_size: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Facets {
	/// Separator between id and label in `blender_backend` facet values, e.g. "::".
	pub delimiter: Option<String>,
	/// Blended facet fields keyed by the name they are reported under.
	#[serde(default)]
	pub fields: BTreeMap<String, FacetField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FacetField {
	#[serde(default, rename = "type")]
	pub kind: FacetKind,
	/// Per-backend source of this facet, keyed by backend id. Backends without an entry do not
	/// contribute.
	#[serde(default)]
	pub mappings: BTreeMap<String, FacetMapping>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetKind {
	#[default]
	Normal,
	/// Only mapped values count; they collapse to "true" or "false".
	Boolean,
	/// Values look like `1/Book/eBook/`; counts also roll up into every parent level.
	Hierarchical,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FacetMapping {
	/// Facet field name on the backend side.
	pub field: String,
	/// Backend value to blended value.
	#[serde(default)]
	pub values: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
	pub id: String,
	pub label: String,
	#[serde(default = "default_enabled")]
	pub enabled: bool,
	pub api_base: String,
	#[serde(default = "default_search_path")]
	pub search_path: String,
	#[serde(default = "default_record_path")]
	pub record_path: String,
	pub api_key: Option<String>,
	#[serde(default = "default_backend_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_enabled() -> bool {
	true
}

fn default_search_path() -> String {
	"/search".to_string()
}

fn default_record_path() -> String {
	"/record".to_string()
}

fn default_backend_timeout_ms() -> u64 {
	5_000
}

mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	AdaptiveBlockSize, BackendConfig, Blending, Config, FacetField, FacetKind, FacetMapping, Facets,
	MIN_BLEND_LIMIT, Service,
};

use std::{collections::HashSet, fs, path::Path};

/// Facet name reserved for per-backend result counts.
pub const BACKEND_FACET: &str = "blender_backend";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::validation("service.http_bind must be non-empty."));
	}
	if cfg.blending.block_size == 0 {
		return Err(Error::validation("blending.block_size must be greater than zero."));
	}
	if cfg.blending.backend_timeout_ms == 0 {
		return Err(Error::validation("blending.backend_timeout_ms must be greater than zero."));
	}

	for range in &cfg.blending.adaptive_block_sizes {
		if range.block_size == 0 {
			return Err(Error::validation(format!(
				"blending.adaptive_block_sizes entry {}-{} must have a block_size greater than zero.",
				range.min_total, range.max_total
			)));
		}
		if range.min_total > range.max_total {
			return Err(Error::validation(format!(
				"blending.adaptive_block_sizes entry {}-{} must have min_total less than or equal to max_total.",
				range.min_total, range.max_total
			)));
		}
	}

	if let Some(delimiter) = cfg.facets.delimiter.as_deref()
		&& delimiter.trim().is_empty()
	{
		return Err(Error::validation("facets.delimiter must be non-empty when set."));
	}

	let mut seen = HashSet::new();

	for backend in &cfg.backends {
		if backend.id.trim().is_empty() {
			return Err(Error::validation("backends.id must be non-empty."));
		}
		if !seen.insert(backend.id.as_str()) {
			return Err(Error::validation(format!(
				"backends.id {} is declared more than once.",
				backend.id
			)));
		}
		if let Some(delimiter) = cfg.facets.delimiter.as_deref()
			&& backend.id.contains(delimiter)
		{
			return Err(Error::validation(format!(
				"backends.id {} must not contain the facet delimiter {delimiter}.",
				backend.id
			)));
		}
		if backend.enabled && backend.api_base.trim().is_empty() {
			return Err(Error::validation(format!(
				"backends.api_base must be non-empty for backend {}.",
				backend.id
			)));
		}
		if backend.timeout_ms == 0 {
			return Err(Error::validation(format!(
				"backends.timeout_ms must be greater than zero for backend {}.",
				backend.id
			)));
		}
	}

	if cfg.enabled_backends().next().is_none() {
		return Err(Error::validation("At least one enabled backend is required."));
	}

	for (name, field) in &cfg.facets.fields {
		if name.trim().is_empty() || name == BACKEND_FACET {
			return Err(Error::validation(format!(
				"facets.fields name {name:?} is empty or reserved."
			)));
		}

		for (backend_id, mapping) in &field.mappings {
			if !cfg.backends.iter().any(|backend| backend.id == *backend_id) {
				return Err(Error::validation(format!(
					"facets.fields.{name} maps unknown backend {backend_id}."
				)));
			}
			if mapping.field.trim().is_empty() {
				return Err(Error::validation(format!(
					"facets.fields.{name}.mappings.{backend_id}.field must be non-empty."
				)));
			}
		}
	}

	for id in &cfg.blending.initial_results {
		if cfg.backend(id).is_none() {
			return Err(Error::validation(format!(
				"blending.initial_results references unknown or disabled backend {id}."
			)));
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.facets.delimiter.as_deref().map(|delimiter| delimiter.trim().is_empty()).unwrap_or(false)
	{
		cfg.facets.delimiter = None;
	}

	for backend in &mut cfg.backends {
		if backend.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
			backend.api_key = None;
		}
	}
}

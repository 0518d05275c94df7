//! Active backend resolution from the `blender_backend` pseudo-facet.
//!
//! Accepted filter forms in `fq`:
//!
//! - `blender_backend:"A"` and `blender_backend:A`
//! - `{!tag=blender_backend_filter}blender_backend:(blender_backend:"A" OR blender_backend:"B")`
//! - `-blender_backend:"A"`, applied after every positive filter
//!
//! With a facet delimiter configured, a value `A::Label` names backend `A`.

use std::sync::LazyLock;

use regex::Regex;

use crate::{BackendRegistry, Error, ParamBag, Result};

pub const BACKEND_FACET: &str = "blender_backend";
pub const FILTER_QUERY_KEY: &str = "fq";
pub const FACET_FIELD_KEY: &str = "facet.field";

const OR_TERM_PATTERN: &str = r#"blender_backend:(?:"([^"]*)"|([^\s()"]+))"#;

static OR_TERMS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(OR_TERM_PATTERN).expect("OR term pattern must compile."));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBackends {
	/// Active backend ids in declared order.
	pub active: Vec<String>,
	/// Request params with every pseudo-facet entry removed.
	pub params: ParamBag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BackendFilter {
	negated: bool,
	ids: Vec<String>,
}

pub fn resolve_active_backends(
	registry: &BackendRegistry,
	params: &ParamBag,
	delimiter: Option<&str>,
) -> Result<ResolvedBackends> {
	let mut include = Vec::new();
	let mut exclude = Vec::new();
	let mut filtered = false;

	for value in params.get(FILTER_QUERY_KEY).unwrap_or_default() {
		let Some(filter) = parse_filter(value, delimiter) else {
			continue;
		};

		filtered = true;

		for id in filter.ids {
			if registry.get(&id).is_none() {
				return Err(Error::InvalidBackendFilter { backend_id: id });
			}

			let target = if filter.negated { &mut exclude } else { &mut include };

			if !target.contains(&id) {
				target.push(id);
			}
		}
	}

	let active = registry
		.ids()
		.filter(|id| include.is_empty() || include.iter().any(|included| included == *id))
		.filter(|id| !exclude.iter().any(|excluded| excluded == *id))
		.map(str::to_string)
		.collect::<Vec<_>>();
	let mut cleaned = params.clone();

	cleaned.retain_values(FILTER_QUERY_KEY, |value| parse_filter(value, delimiter).is_none());
	cleaned.retain_values(FACET_FIELD_KEY, |value| !is_backend_facet_field(value));

	if filtered {
		tracing::info!(active = ?active, "Backend filter narrowed the active backend set.");
	}

	Ok(ResolvedBackends { active, params: cleaned })
}

/// Strips a leading `{!...}` local-params prefix.
fn strip_local_params(value: &str) -> &str {
	let value = value.trim();

	if value.starts_with("{!")
		&& let Some(end) = value.find('}')
	{
		return value[end + 1..].trim_start();
	}

	value
}

fn is_backend_facet_field(value: &str) -> bool {
	strip_local_params(value) == BACKEND_FACET
}

fn parse_filter(value: &str, delimiter: Option<&str>) -> Option<BackendFilter> {
	let body = strip_local_params(value);
	let (negated, body) = match body.strip_prefix('-') {
		Some(rest) => (true, rest),
		None => (false, body),
	};
	let rest = body.strip_prefix(BACKEND_FACET)?.strip_prefix(':')?.trim();
	let raw_ids = if let Some(group) = rest.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
		OR_TERMS
			.captures_iter(group)
			.filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
			.map(|m| m.as_str().to_string())
			.collect::<Vec<_>>()
	} else {
		vec![unquote(rest).to_string()]
	};
	let ids = raw_ids.into_iter().map(|raw| backend_id_of(&raw, delimiter)).collect();

	Some(BackendFilter { negated, ids })
}

fn unquote(value: &str) -> &str {
	value.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(value)
}

fn backend_id_of(value: &str, delimiter: Option<&str>) -> String {
	let id = match delimiter {
		Some(delimiter) => value.split_once(delimiter).map(|(id, _)| id).unwrap_or(value),
		None => value,
	};

	id.trim().to_string()
}

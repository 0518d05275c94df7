//! Facet merging across the initial per-backend result sets.
//!
//! Each configured field names, per backend, the backend-side field to read and an optional value
//! map. Counts for equal blended values are summed and each field is ordered by count, highest
//! first.

use std::collections::{BTreeMap, HashMap};

use blend_config::{FacetField, FacetKind, FacetMapping};

use crate::ResultSet;

/// Blended facet counts keyed by configured field name.
pub type FacetCounts = BTreeMap<String, Vec<(String, usize)>>;

/// Merges facet counts from `sets`, given as `(backend_id, result)` in declared order.
///
/// Fields with no contributing value are left out.
pub fn merge_facets<'a, I>(fields: &BTreeMap<String, FacetField>, sets: I) -> FacetCounts
where
	I: IntoIterator<Item = (&'a str, &'a ResultSet)>,
	I::IntoIter: Clone,
{
	let sets = sets.into_iter();
	let mut merged = FacetCounts::new();

	for (name, field) in fields {
		let mut counts = Tally::default();

		for (backend_id, set) in sets.clone() {
			let Some(mapping) = field.mappings.get(backend_id) else {
				continue;
			};
			let Some(entries) = set.facets.get(&mapping.field) else {
				continue;
			};

			for (value, count) in entries {
				let Some(value) = blended_value(field.kind, mapping, value) else {
					continue;
				};

				if field.kind == FacetKind::Hierarchical {
					for parent in parent_levels(&value) {
						counts.add(parent, *count);
					}
				}

				counts.add(value, *count);
			}
		}

		if !counts.is_empty() {
			merged.insert(name.clone(), counts.into_sorted());
		}
	}

	merged
}

/// Blended form of a backend value, or `None` when the value does not take part.
fn blended_value(kind: FacetKind, mapping: &FacetMapping, value: &str) -> Option<String> {
	let mapped = mapping.values.get(value);

	match kind {
		FacetKind::Boolean => mapped.map(|mapped| is_truthy(mapped).to_string()),
		FacetKind::Normal => Some(mapped.cloned().unwrap_or_else(|| value.to_string())),
		FacetKind::Hierarchical => {
			let value = mapped.map(String::as_str).unwrap_or(value);

			if hierarchy_parts(value).is_some() {
				Some(value.to_string())
			} else {
				Some(format!("0/{value}/"))
			}
		},
	}
}

fn is_truthy(value: &str) -> bool {
	let value = value.trim();

	!(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}

/// Splits `N/a/b/.../` into its level and path segments.
fn hierarchy_parts(value: &str) -> Option<(usize, Vec<&str>)> {
	let (level, path) = value.split_once('/')?;
	let path = path.strip_suffix('/')?;

	if level.is_empty() || !level.bytes().all(|b| b.is_ascii_digit()) || path.is_empty() {
		return None;
	}

	Some((level.parse().ok()?, path.split('/').collect()))
}

/// Every ancestor of a hierarchical value, deepest first: `2/a/b/c/` yields `1/a/b/`, `0/a/`.
fn parent_levels(value: &str) -> Vec<String> {
	let Some((level, parts)) = hierarchy_parts(value) else {
		return Vec::new();
	};

	(0..level)
		.rev()
		.filter(|depth| *depth < parts.len())
		.map(|depth| format!("{depth}/{}/", parts[..=depth].join("/")))
		.collect()
}

/// Summed counts in first-seen order.
#[derive(Default)]
struct Tally {
	index: HashMap<String, usize>,
	entries: Vec<(String, usize)>,
}
impl Tally {
	fn add(&mut self, value: String, count: usize) {
		match self.index.get(&value) {
			Some(slot) => self.entries[*slot].1 += count,
			None => {
				self.index.insert(value.clone(), self.entries.len());
				self.entries.push((value, count));
			},
		}
	}

	fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Highest count first; ties keep first-seen order.
	fn into_sorted(self) -> Vec<(String, usize)> {
		let mut entries = self.entries;

		entries.sort_by(|a, b| b.1.cmp(&a.1));

		entries
	}
}

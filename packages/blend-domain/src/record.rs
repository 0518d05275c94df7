use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
	/// Identifier of the backend that produced this record.
	pub backend_id: String,
	pub id: String,
	pub payload: Value,
}
impl RawRecord {
	pub fn new(backend_id: impl Into<String>, id: impl Into<String>, payload: Value) -> Self {
		Self { backend_id: backend_id.into(), id: id.into(), payload }
	}
}

/// One backend's answer to a single search or retrieve call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
	pub source_id: String,
	pub records: Vec<RawRecord>,
	/// Total matches reported by the backend, not the number of records returned.
	pub total: usize,
	/// Non-fatal messages reported by the backend.
	#[serde(default)]
	pub errors: Vec<String>,
	/// Facet counts keyed by the backend's own field name, in the order the backend reported them.
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub facets: BTreeMap<String, Vec<(String, usize)>>,
}
impl ResultSet {
	pub fn new(source_id: impl Into<String>, records: Vec<RawRecord>, total: usize) -> Self {
		Self {
			source_id: source_id.into(),
			records,
			total,
			errors: Vec::new(),
			facets: BTreeMap::new(),
		}
	}

	pub fn empty(source_id: impl Into<String>) -> Self {
		Self::new(source_id, Vec::new(), 0)
	}

	pub fn with_error(mut self, message: impl Into<String>) -> Self {
		self.errors.push(message.into());

		self
	}

	pub fn with_facet(mut self, field: impl Into<String>, counts: Vec<(String, usize)>) -> Self {
		self.facets.insert(field.into(), counts);

		self
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

use serde::Serialize;

pub const PARTIAL_FAILURE_CODE: &str = "search_backend_partial_failure";
pub const BACKEND_MESSAGE_CODE: &str = "search_backend_message";

/// Non-fatal conditions attached to a merged window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code")]
pub enum Warning {
	/// One or more backends failed while others answered. Holds the failed backends' labels.
	#[serde(rename = "search_backend_partial_failure")]
	PartialFailure { backends: Vec<String> },
	/// A message a backend reported inside an otherwise successful response.
	#[serde(rename = "search_backend_message")]
	BackendMessage { backend_id: String, label: String, message: String },
}
impl Warning {
	pub fn code(&self) -> &'static str {
		match self {
			Self::PartialFailure { .. } => PARTIAL_FAILURE_CODE,
			Self::BackendMessage { .. } => BACKEND_MESSAGE_CODE,
		}
	}

	pub fn message(&self) -> String {
		match self {
			Self::PartialFailure { backends } =>
				format!("Search failed in: {}.", backends.join(", ")),
			Self::BackendMessage { label, message, .. } => format!("{label}: {message}"),
		}
	}
}

/// Insertion-ordered warning list without duplicates.
#[derive(Debug, Clone, Default)]
pub(crate) struct Warnings {
	items: Vec<Warning>,
}
impl Warnings {
	pub(crate) fn push(&mut self, warning: Warning) {
		if !self.items.contains(&warning) {
			self.items.push(warning);
		}
	}

	pub(crate) fn push_partial_failure(&mut self, labels: Vec<String>) {
		if labels.is_empty() {
			return;
		}

		let mut backends: Vec<String> = Vec::with_capacity(labels.len());

		for label in labels {
			if !backends.contains(&label) {
				backends.push(label);
			}
		}

		self.push(Warning::PartialFailure { backends });
	}

	pub(crate) fn into_vec(self) -> Vec<Warning> {
		self.items
	}
}

use serde::{Deserialize, Serialize};

/// Backend-agnostic user query. Backends interpret it; the blender only passes it through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
	pub text: String,
	/// Search handler such as "AllFields" or "Title".
	pub handler: Option<String>,
}
impl Query {
	pub fn new(text: impl Into<String>) -> Self {
		Self { text: text.into(), handler: None }
	}

	pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
		self.handler = Some(handler.into());

		self
	}
}

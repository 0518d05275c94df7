pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid blender_backend filter: backend {backend_id} is not enabled.")]
	InvalidBackendFilter { backend_id: String },
	#[error("Search in {backend_id} failed: {source}")]
	Backend { backend_id: String, source: BackendError },
	#[error("Configuration error: {message}")]
	Configuration { message: String },
}

/// Failure of a single backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
	#[error("Backend call timed out after {timeout_ms} ms.")]
	Timeout { timeout_ms: u64 },
	#[error("Backend transport error: {message}")]
	Transport { message: String },
	#[error("Backend returned an invalid response: {message}")]
	InvalidResponse { message: String },
	#[error("Backend unavailable: {message}")]
	Unavailable { message: String },
	#[error("Backend task failed: {message}")]
	TaskFailed { message: String },
}
impl BackendError {
	pub fn unavailable(message: impl Into<String>) -> Self {
		Self::Unavailable { message: message.into() }
	}

	pub(crate) fn from_provider(err: blend_providers::Error, timeout_ms: u64) -> Self {
		if err.is_timeout() {
			return Self::Timeout { timeout_ms };
		}

		match err {
			blend_providers::Error::SerdeJson(inner) =>
				Self::InvalidResponse { message: inner.to_string() },
			blend_providers::Error::InvalidResponse { message } => Self::InvalidResponse { message },
			other => Self::Transport { message: other.to_string() },
		}
	}
}

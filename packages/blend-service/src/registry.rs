use std::sync::Arc;

use crate::{BackendError, BackendResult, BoxFuture, Error, ParamBag, Query, Result, ResultSet, SearchBackend};
use blend_config::{BackendConfig, Config};
use blend_providers::json::JsonClient;

/// A backend plus the identity the blender reports it under.
#[derive(Clone)]
pub struct RegisteredBackend {
	pub id: String,
	pub label: String,
	pub backend: Arc<dyn SearchBackend>,
}

/// Read-only, ordered backend set. Declaration order is the blending order.
#[derive(Clone, Default)]
pub struct BackendRegistry {
	backends: Vec<RegisteredBackend>,
}
impl BackendRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_config(cfg: &Config) -> Result<Self> {
		let mut registry = Self::new();

		for backend_cfg in cfg.enabled_backends() {
			let backend = JsonBackend::new(backend_cfg)?;

			registry.register(&backend_cfg.id, &backend_cfg.label, Arc::new(backend))?;
		}

		Ok(registry)
	}

	pub fn register(
		&mut self,
		id: impl Into<String>,
		label: impl Into<String>,
		backend: Arc<dyn SearchBackend>,
	) -> Result<()> {
		let id = id.into();

		if id.trim().is_empty() {
			return Err(Error::Configuration { message: "Backend id must be non-empty.".to_string() });
		}
		if self.get(&id).is_some() {
			return Err(Error::Configuration { message: format!("Backend {id} is registered twice.") });
		}

		self.backends.push(RegisteredBackend { id, label: label.into(), backend });

		Ok(())
	}

	/// Builder form of [`BackendRegistry::register`].
	pub fn with_backend(
		mut self,
		id: impl Into<String>,
		label: impl Into<String>,
		backend: Arc<dyn SearchBackend>,
	) -> Result<Self> {
		self.register(id, label, backend)?;

		Ok(self)
	}

	pub fn get(&self, id: &str) -> Option<&RegisteredBackend> {
		self.backends.iter().find(|backend| backend.id == id)
	}

	pub fn iter(&self) -> impl Iterator<Item = &RegisteredBackend> {
		self.backends.iter()
	}

	pub fn ids(&self) -> impl Iterator<Item = &str> {
		self.backends.iter().map(|backend| backend.id.as_str())
	}

	pub fn len(&self) -> usize {
		self.backends.len()
	}

	pub fn is_empty(&self) -> bool {
		self.backends.is_empty()
	}
}

/// [`SearchBackend`] over the generic JSON-over-HTTP contract.
pub struct JsonBackend {
	client: JsonClient,
	timeout_ms: u64,
}
impl JsonBackend {
	pub fn new(cfg: &BackendConfig) -> Result<Self> {
		let client = JsonClient::new(cfg).map_err(|err| Error::Configuration {
			message: format!("Failed to build client for backend {}: {err}", cfg.id),
		})?;

		Ok(Self { client, timeout_ms: cfg.timeout_ms })
	}
}
impl SearchBackend for JsonBackend {
	fn search<'a>(
		&'a self,
		query: &'a Query,
		offset: usize,
		limit: usize,
		params: &'a ParamBag,
	) -> BoxFuture<'a, BackendResult<ResultSet>> {
		Box::pin(async move {
			self.client
				.search(query, offset, limit, params)
				.await
				.map_err(|err| BackendError::from_provider(err, self.timeout_ms))
		})
	}

	fn retrieve<'a>(
		&'a self,
		id: &'a str,
		params: &'a ParamBag,
	) -> BoxFuture<'a, BackendResult<ResultSet>> {
		Box::pin(async move {
			self.client
				.retrieve(id, params)
				.await
				.map_err(|err| BackendError::from_provider(err, self.timeout_ms))
		})
	}
}

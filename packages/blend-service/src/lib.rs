pub mod error;
pub mod facets;
pub mod hooks;
pub mod registry;
pub mod resolver;
pub mod retrieve;
pub mod search;
pub mod settings;
pub mod warnings;
pub mod window;

mod dispatch;
mod fetch;
mod merge;

pub use blend_domain::{ParamBag, Query, RawRecord, ResultSet};
pub use error::{BackendError, BackendResult, Error, Result};
pub use facets::FacetCounts;
pub use hooks::{BackendCall, CallKind, CallOutcome, LifecycleHook, TracingHook};
pub use registry::{BackendRegistry, JsonBackend, RegisteredBackend};
pub use search::{BackendInput, SearchRequest};
pub use settings::BlendSettings;
pub use warnings::{PARTIAL_FAILURE_CODE, Warning};
pub use window::{BLENDER_SOURCE_ID, BackendCount, MergedWindow, WindowEntry};

use std::{future::Future, pin::Pin, sync::Arc};

use blend_config::Config;

use crate::dispatch::Dispatcher;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A search source the blender can interleave.
pub trait SearchBackend
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		query: &'a Query,
		offset: usize,
		limit: usize,
		params: &'a ParamBag,
	) -> BoxFuture<'a, BackendResult<ResultSet>>;

	fn retrieve<'a>(
		&'a self,
		id: &'a str,
		params: &'a ParamBag,
	) -> BoxFuture<'a, BackendResult<ResultSet>>;
}

/// Blends search results from every backend in a read-only registry.
///
/// Cloning is cheap. No state survives a call: each search rebuilds its cursors from scratch.
#[derive(Clone)]
pub struct Blender {
	registry: Arc<BackendRegistry>,
	settings: Arc<BlendSettings>,
	dispatcher: Dispatcher,
}
impl Blender {
	pub fn new(registry: Arc<BackendRegistry>, settings: BlendSettings) -> Result<Self> {
		if registry.is_empty() {
			return Err(Error::Configuration {
				message: "At least one backend must be registered.".to_string(),
			});
		}
		if settings.block_size == 0 {
			return Err(Error::Configuration {
				message: "Block size must be greater than zero.".to_string(),
			});
		}
		if let Some(range) = settings.adaptive_block_sizes.iter().find(|range| range.block_size == 0)
		{
			return Err(Error::Configuration {
				message: format!(
					"Adaptive block size for totals {}-{} must be greater than zero.",
					range.min_total, range.max_total
				),
			});
		}
		if let Some(id) = settings.initial_results.iter().find(|id| registry.get(id).is_none()) {
			return Err(Error::Configuration {
				message: format!("Pinned result slot references unknown backend {id}."),
			});
		}

		let mut dispatcher = Dispatcher::new(settings.backend_timeout);

		dispatcher.push_hook(Arc::new(TracingHook));

		Ok(Self { registry, settings: Arc::new(settings), dispatcher })
	}

	/// Builds a blender over JSON backends for every enabled backend in `cfg`.
	pub fn from_config(cfg: &Config) -> Result<Self> {
		let registry = BackendRegistry::from_config(cfg)?;

		Self::new(Arc::new(registry), BlendSettings::from_config(cfg))
	}

	/// Appends a lifecycle hook. Hooks run in the order they were added, after the built-in
	/// [`TracingHook`].
	pub fn with_hook(mut self, hook: Arc<dyn LifecycleHook>) -> Self {
		self.dispatcher.push_hook(hook);

		self
	}

	pub fn registry(&self) -> &BackendRegistry {
		&self.registry
	}

	pub fn settings(&self) -> &BlendSettings {
		&self.settings
	}
}

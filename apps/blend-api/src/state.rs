use std::sync::Arc;

use blend_service::Blender;

#[derive(Clone)]
pub struct AppState {
	pub blender: Arc<Blender>,
}
impl AppState {
	pub fn new(config: &blend_config::Config) -> color_eyre::Result<Self> {
		let blender = Blender::from_config(config)?;

		Ok(Self::from_blender(blender))
	}

	pub fn from_blender(blender: Blender) -> Self {
		Self { blender: Arc::new(blender) }
	}
}

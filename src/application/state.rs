use std::sync::Arc;

use crate::application::auth::RenderKey;
use crate::infrastructure::renderer::{PinRenderer, RenderError, RendererConfig};

pub struct AppStateConfig {
    pub renderer: RendererConfig,
    pub render_key: String,
    pub allow_any_origin: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<PinRenderer>,
    pub render_key: Arc<RenderKey>,
    pub allow_any_origin: bool,
}

impl AppState {
    pub fn new(config: AppStateConfig) -> Result<Self, RenderError> {
        Ok(Self {
            renderer: Arc::new(PinRenderer::new(config.renderer)?),
            render_key: Arc::new(RenderKey::new(&config.render_key)),
            allow_any_origin: config.allow_any_origin,
        })
    }
}

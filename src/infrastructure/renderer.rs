use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::layout::{CANVAS_HEIGHT, CANVAS_WIDTH, PinLayout};
use crate::domain::pins::{MainImage, OutputFormat, PinSpec};
use crate::infrastructure::fonts::{FontCache, FontError, FontSet, FontSource};
use crate::infrastructure::images::{self, EmbeddedImage, ImageError};
use crate::infrastructure::raster::{self, RasterError};
use crate::infrastructure::svg;

const USER_AGENT: &str = concat!("pinrender/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to load main image: {0}")]
    Image(#[from] ImageError),
    #[error("failed to load fonts: {0}")]
    Font(#[from] FontError),
    #[error("failed to rasterize pin: {0}")]
    Raster(#[from] RasterError),
    #[error("render task failed: {0}")]
    Task(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[derive(Clone, Debug)]
pub struct RendererConfig {
    pub title_font: FontSource,
    pub subtitle_font: FontSource,
    /// Used when a request does not name a main image.
    pub default_image_url: String,
}

#[derive(Debug)]
pub struct RenderedPin {
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
}

/// Turns a [`PinSpec`] into image bytes: layout, vector document, raster.
pub struct PinRenderer {
    http: reqwest::Client,
    fonts: FontCache,
    default_image_url: String,
}

impl PinRenderer {
    pub fn new(config: RendererConfig) -> Result<Self, RenderError> {
        let http = reqwest::ClientBuilder::new()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| RenderError::Client(e.to_string()))?;

        Ok(Self {
            http,
            fonts: FontCache::new(config.title_font, config.subtitle_font),
            default_image_url: config.default_image_url,
        })
    }

    pub fn default_image_url(&self) -> &str {
        &self.default_image_url
    }

    pub fn fonts_loaded(&self) -> bool {
        self.fonts.is_loaded()
    }

    /// Render `spec` to PNG. Single attempt; any failure is returned as is.
    pub async fn render(&self, spec: &PinSpec) -> Result<RenderedPin, RenderError> {
        let (_, rendered) = self.render_with_document(spec).await?;
        Ok(rendered)
    }

    /// Render `spec` and also return the SVG document the PNG was drawn
    /// from. The main image and fonts are loaded once for both.
    pub async fn render_with_document(
        &self,
        spec: &PinSpec,
    ) -> Result<(String, RenderedPin), RenderError> {
        let (image, fonts) = self.prepare(spec).await?;
        let layout = PinLayout::new(spec);

        let (document, bytes) = tokio::task::spawn_blocking(move || {
            let document = svg::build_document(&layout, image.as_ref(), &fonts);
            debug!(bytes = document.len(), "vector document built");
            let bytes = raster::rasterize_png(
                &document,
                Arc::clone(&fonts.database),
                CANVAS_WIDTH,
                CANVAS_HEIGHT,
            )?;
            Ok::<_, RasterError>((document, bytes))
        })
        .await
        .map_err(|e| RenderError::Task(e.to_string()))??;

        info!(bytes = bytes.len(), "pin rendered");
        Ok((
            document,
            RenderedPin {
                format: spec.format,
                bytes,
            },
        ))
    }

    async fn prepare(
        &self,
        spec: &PinSpec,
    ) -> Result<(Option<EmbeddedImage>, Arc<FontSet>), RenderError> {
        let image = match &spec.main_image {
            MainImage::Source(source) => Some(images::load_main_image(&self.http, source).await?),
            MainImage::Placeholder => None,
        };
        let fonts = self.fonts.get(&self.http).await?;
        Ok((image, fonts))
    }
}

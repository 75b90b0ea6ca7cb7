use anyhow::{Context, Result};
use tracing::info;

use super::{RenderCommand, write_output};
use crate::infrastructure::renderer::PinRenderer;

/// Run the render pipeline in-process, without a server or key.
pub async fn run(command: RenderCommand) -> Result<()> {
    let renderer =
        PinRenderer::new(command.renderer.into()).context("failed to set up renderer")?;
    let spec = command
        .pin
        .into_request()
        .await?
        .resolve(renderer.default_image_url())?;

    let rendered = match &command.svg {
        Some(svg_path) => {
            let (document, rendered) = renderer.render_with_document(&spec).await?;
            tokio::fs::write(svg_path, document)
                .await
                .with_context(|| format!("failed to write {}", svg_path.display()))?;
            info!(path = %svg_path.display(), "vector document written");
            rendered
        }
        None => renderer.render(&spec).await?,
    };

    write_output(&command.output, &rendered.bytes, command.open).await
}

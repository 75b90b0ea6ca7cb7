use std::sync::Arc;

use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{self, fontdb};

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("invalid vector document: {0}")]
    Parse(String),
    #[error("vector document is {actual_width}x{actual_height}, expected {width}x{height}")]
    UnexpectedSize {
        width: u32,
        height: u32,
        actual_width: f32,
        actual_height: f32,
    },
    #[error("failed to allocate a {0}x{1} pixmap")]
    Pixmap(u32, u32),
    #[error("failed to encode PNG: {0}")]
    Encode(String),
}

/// Rasterize `svg` at 1:1 scale into a `width`×`height` PNG.
///
/// Text is resolved against `fonts` only; system fonts are never consulted,
/// so identical inputs give identical bytes.
pub fn rasterize_png(
    svg: &str,
    fonts: Arc<fontdb::Database>,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, RasterError> {
    let options = usvg::Options {
        fontdb: fonts,
        ..usvg::Options::default()
    };

    let tree =
        usvg::Tree::from_str(svg, &options).map_err(|e| RasterError::Parse(e.to_string()))?;

    let size = tree.size();
    #[allow(clippy::cast_precision_loss)]
    let matches = (size.width() - width as f32).abs() < 0.5
        && (size.height() - height as f32).abs() < 0.5;
    if !matches {
        return Err(RasterError::UnexpectedSize {
            width,
            height,
            actual_width: size.width(),
            actual_height: size.height(),
        });
    }

    let mut pixmap = Pixmap::new(width, height).ok_or(RasterError::Pixmap(width, height))?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| RasterError::Encode(e.to_string()))
}

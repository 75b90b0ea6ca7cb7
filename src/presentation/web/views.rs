use crate::domain::layout::PinLayout;
use crate::domain::pins::{MainImage, PinRequest, PinSpec};

/// The preview draws the 1000×1500 layout at 500×750.
pub const PREVIEW_SCALE: f32 = 0.5;

/// Pixel geometry and content of the preview, in CSS pixels.
#[derive(Debug, Clone)]
pub struct PinPreviewView {
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub image_height: f32,
    pub image_url: Option<String>,
    pub band_top: f32,
    pub band_height: f32,
    pub band_color: String,
    pub padding_x: f32,
    pub text_gap: f32,
    pub title: String,
    pub title_size: f32,
    pub title_line_height: f32,
    pub title_letter_spacing: f32,
    pub subtitle: Option<String>,
    pub subtitle_size: f32,
    pub subtitle_line_height: f32,
    pub subtitle_opacity: f32,
}

impl PinPreviewView {
    pub fn new(layout: &PinLayout, scale: f32) -> Self {
        let canvas = layout.canvas.scaled(scale);
        let image = layout.image.scaled(scale);
        let band = layout.band.scaled(scale);
        let title = &layout.title.style;
        let subtitle = layout.subtitle.as_ref();

        Self {
            width: canvas.width,
            height: canvas.height,
            corner_radius: layout.corner_radius * scale,
            image_height: image.height,
            image_url: match &layout.image_source {
                MainImage::Source(source) => Some(source.clone()),
                MainImage::Placeholder => None,
            },
            band_top: band.y,
            band_height: band.height,
            band_color: layout.band_color.to_string(),
            padding_x: (layout.text_area.x - layout.band.x) * scale,
            text_gap: layout.text_gap * scale,
            title: layout.title.text.clone(),
            title_size: title.size * scale,
            title_line_height: title.line_height,
            title_letter_spacing: title.letter_spacing * scale,
            subtitle: subtitle.map(|block| block.text.clone()),
            subtitle_size: subtitle.map_or(0.0, |block| block.style.size * scale),
            subtitle_line_height: subtitle.map_or(1.0, |block| block.style.line_height),
            subtitle_opacity: subtitle.map_or(1.0, |block| block.style.opacity),
        }
    }
}

/// Current form values, echoed back into the controls.
#[derive(Debug, Clone)]
pub struct PinFormView {
    pub main_image: String,
    pub title: String,
    pub subtitle: String,
    /// Always a `#RRGGBB` value the color input accepts.
    pub color: String,
    pub color_text: String,
}

impl PinFormView {
    pub fn new(request: &PinRequest, spec: &PinSpec) -> Self {
        let main_image = match &spec.main_image {
            MainImage::Source(source) => source.clone(),
            MainImage::Placeholder => String::new(),
        };

        Self {
            main_image,
            title: request.title.clone().unwrap_or_else(|| spec.title.clone()),
            subtitle: request
                .subtitle
                .clone()
                .unwrap_or_else(|| spec.subtitle.clone().unwrap_or_default()),
            color: spec.color.rgb_hex(),
            color_text: request
                .color
                .clone()
                .unwrap_or_else(|| spec.color.to_string()),
        }
    }
}

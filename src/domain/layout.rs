//! The fixed pin template.
//!
//! Everything here is in layout units of the 1000×1500 output canvas. The
//! image service draws this layout at 1:1 and the preview page at half scale.

use crate::domain::pins::{BandColor, MainImage, PinSpec};

pub const CANVAS_WIDTH: u32 = 1000;
pub const CANVAS_HEIGHT: u32 = 1500;
pub const CORNER_RADIUS: f32 = 20.0;

pub const IMAGE_HEIGHT: f32 = 1200.0;
pub const BAND_HEIGHT: f32 = 314.0;
pub const BAND_PADDING_X: f32 = 40.0;
pub const BAND_PADDING_Y: f32 = 80.0;
pub const TEXT_GAP: f32 = 18.0;

pub const CANVAS_BACKGROUND: &str = "#FFFFFF";
pub const PLACEHOLDER_FILL: &str = "#E7E2DC";
pub const PLACEHOLDER_TEXT_FILL: &str = "#8A8178";
pub const PLACEHOLDER_LABEL: &str = "Image placeholder";
pub const TEXT_FILL: &str = "#FFFFFF";

pub const TITLE_STYLE: TextStyle = TextStyle {
    role: FontRole::Title,
    size: 90.0,
    line_height: 1.05,
    letter_spacing: 1.28,
    opacity: 1.0,
};

pub const SUBTITLE_STYLE: TextStyle = TextStyle {
    role: FontRole::Subtitle,
    size: 36.0,
    line_height: 1.25,
    letter_spacing: 0.0,
    opacity: 0.95,
};

pub const PLACEHOLDER_STYLE: TextStyle = TextStyle {
    role: FontRole::Subtitle,
    size: 32.0,
    line_height: 1.25,
    letter_spacing: 0.0,
    opacity: 1.0,
};

pub const IMAGE_SHADOW: DropShadow = DropShadow {
    offset_y: 6.0,
    blur: 10.0,
    opacity: 0.18,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Shrink by `dx` on the left and right and `dy` on the top and bottom.
    pub fn inset(&self, dx: f32, dy: f32) -> Self {
        Self::new(
            self.x + dx,
            self.y + dy,
            (self.width - 2.0 * dx).max(0.0),
            (self.height - 2.0 * dy).max(0.0),
        )
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }
}

/// Which of the two font assets a piece of text is set in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontRole {
    /// Display serif, heavy weight.
    Title,
    /// Humanist sans, medium weight.
    Subtitle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub role: FontRole,
    pub size: f32,
    /// Multiple of `size`.
    pub line_height: f32,
    pub letter_spacing: f32,
    pub opacity: f32,
}

impl TextStyle {
    pub fn line_box(&self) -> f32 {
        self.size * self.line_height
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DropShadow {
    pub offset_y: f32,
    pub blur: f32,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    pub text: String,
    pub style: TextStyle,
}

/// Top edges of the stacked text blocks once their line counts are known.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextOrigins {
    pub title_top: f32,
    pub subtitle_top: Option<f32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PinLayout {
    pub canvas: Rect,
    pub corner_radius: f32,
    pub image: Rect,
    pub image_source: MainImage,
    pub image_shadow: DropShadow,
    pub band: Rect,
    pub band_color: BandColor,
    /// Region the text column is centered in.
    pub text_area: Rect,
    pub text_gap: f32,
    pub title: TextBlock,
    pub subtitle: Option<TextBlock>,
}

impl PinLayout {
    pub fn new(spec: &PinSpec) -> Self {
        let canvas = Rect::new(0.0, 0.0, CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32);
        let image = Rect::new(0.0, 0.0, canvas.width, IMAGE_HEIGHT);
        // Anchored to the bottom, so the band overlaps the image to hide the seam.
        let band = Rect::new(0.0, canvas.bottom() - BAND_HEIGHT, canvas.width, BAND_HEIGHT);

        Self {
            canvas,
            corner_radius: CORNER_RADIUS,
            image,
            image_source: spec.main_image.clone(),
            image_shadow: IMAGE_SHADOW,
            band,
            band_color: spec.color,
            text_area: band.inset(BAND_PADDING_X, BAND_PADDING_Y),
            text_gap: TEXT_GAP,
            title: TextBlock {
                text: spec.title.clone(),
                style: TITLE_STYLE,
            },
            subtitle: spec.subtitle.as_ref().map(|text| TextBlock {
                text: text.clone(),
                style: SUBTITLE_STYLE,
            }),
        }
    }

    /// How far the band reaches up into the image region.
    pub fn band_overlap(&self) -> f32 {
        (self.image.bottom() - self.band.y).max(0.0)
    }

    /// Widest a line of text may be before it wraps.
    pub fn max_line_width(&self) -> f32 {
        self.text_area.width
    }

    /// Stack the title and optional subtitle and center the stack vertically
    /// in the text area. The stack may overflow the vertical padding when the
    /// text wraps onto many lines; it stays centered either way.
    pub fn text_origins(&self, title_lines: usize, subtitle_lines: usize) -> TextOrigins {
        let title_height = self.title.style.line_box() * count(title_lines);
        let subtitle_height = self
            .subtitle
            .as_ref()
            .filter(|_| subtitle_lines > 0)
            .map(|block| block.style.line_box() * count(subtitle_lines));

        let total = match subtitle_height {
            Some(height) => title_height + self.text_gap + height,
            None => title_height,
        };

        let title_top = self.text_area.center_y() - total / 2.0;
        TextOrigins {
            title_top,
            subtitle_top: subtitle_height.map(|_| title_top + title_height + self.text_gap),
        }
    }
}

#[allow(clippy::cast_precision_loss)] // Line counts are tiny.
fn count(lines: usize) -> f32 {
    lines as f32
}

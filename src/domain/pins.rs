use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAIN_IMAGE: &str =
    "https://images.unsplash.com/photo-1509440159596-0249088772ff?w=1200&h=1800&fit=crop";
pub const DEFAULT_COLOR: &str = "#5B3A1D";
pub const DEFAULT_TITLE: &str = "BAKE RECIPES";
pub const DEFAULT_SUBTITLE: &str = "Brown minimalist bakery template";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PinError {
    #[error("invalid color {0:?}: expected a CSS color such as #5B3A1D")]
    InvalidColor(String),
}

/// Caller-supplied pin fields. Every field is optional; see [`PinRequest::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl PinRequest {
    /// A request carrying the built-in defaults for every field.
    pub fn with_defaults(default_image: &str) -> Self {
        Self {
            main_image: Some(default_image.to_string()),
            color: Some(DEFAULT_COLOR.to_string()),
            title: Some(DEFAULT_TITLE.to_string()),
            subtitle: Some(DEFAULT_SUBTITLE.to_string()),
            format: Some(OutputFormat::Png.to_string()),
        }
    }

    /// True when the caller asked for something other than PNG.
    pub fn requests_unsupported_format(&self) -> bool {
        self.format
            .as_deref()
            .is_some_and(|format| !format.trim().eq_ignore_ascii_case("png"))
    }

    /// Fill in defaults and normalize every field.
    ///
    /// Missing fields take their defaults. An explicitly empty `main_image`
    /// selects the placeholder fill and an empty `subtitle` drops the line.
    pub fn resolve(self, default_image: &str) -> Result<PinSpec, PinError> {
        let main_image = match self.main_image {
            None => MainImage::Source(default_image.to_string()),
            Some(source) if source.trim().is_empty() => MainImage::Placeholder,
            Some(source) => MainImage::Source(source.trim().to_string()),
        };

        let color = match self.color {
            Some(color) => color.parse()?,
            None => BandColor::default(),
        };

        let title = printable(self.title.as_deref().unwrap_or(DEFAULT_TITLE))
            .trim()
            .to_uppercase();

        let subtitle = match self.subtitle.as_deref().map(printable) {
            None => Some(DEFAULT_SUBTITLE.to_string()),
            Some(subtitle) if subtitle.trim().is_empty() => None,
            Some(subtitle) => Some(subtitle.trim().to_string()),
        };

        Ok(PinSpec {
            main_image,
            color,
            title,
            subtitle,
            format: OutputFormat::Png,
        })
    }
}

/// Drop control characters other than whitespace; they have no glyphs.
fn printable(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect()
}

/// A fully resolved pin, ready for layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinSpec {
    pub main_image: MainImage,
    pub color: BandColor,
    pub title: String,
    pub subtitle: Option<String>,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MainImage {
    /// An http(s) URL or a `data:` URI.
    Source(String),
    Placeholder,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Png => "pin.png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => f.write_str("png"),
        }
    }
}

/// Fill color of the text band, parsed from any CSS color string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BandColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl BandColor {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: u8::MAX,
        }
    }

    /// `#RRGGBB` without the alpha channel.
    pub fn rgb_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }

    pub fn opacity(&self) -> f32 {
        f32::from(self.alpha) / 255.0
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha == u8::MAX
    }
}

impl Default for BandColor {
    fn default() -> Self {
        Self::rgb(0x5B, 0x3A, 0x1D)
    }
}

impl FromStr for BandColor {
    type Err = PinError;

    /// Accepts any CSS color: hex forms, named colors, `rgb()`/`rgba()` and
    /// `hsl()`/`hsla()`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let color: svgtypes::Color = value
            .trim()
            .parse()
            .map_err(|_| PinError::InvalidColor(value.to_string()))?;

        Ok(Self {
            red: color.red,
            green: color.green,
            blue: color.blue,
            alpha: color.alpha,
        })
    }
}

impl fmt::Display for BandColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rgb_hex())?;
        if !self.is_opaque() {
            write!(f, "{:02X}", self.alpha)?;
        }
        Ok(())
    }
}

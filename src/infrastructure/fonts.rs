use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::Url;
use resvg::usvg::fontdb;
use tracing::{debug, info};

use crate::domain::layout::{FontRole, TextStyle};

/// Static Playfair Display ExtraBold build.
pub const DEFAULT_TITLE_FONT: &str =
    "https://cdn.jsdelivr.net/fontsource/fonts/playfair-display@latest/latin-800-normal.ttf";
/// Static Inter SemiBold build.
pub const DEFAULT_SUBTITLE_FONT: &str =
    "https://cdn.jsdelivr.net/fontsource/fonts/inter@latest/latin-600-normal.ttf";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("failed to fetch font {origin}: {message}")]
    Fetch { origin: String, message: String },
    #[error("failed to read font {origin}: {message}")]
    Read { origin: String, message: String },
    #[error("font {origin} is not a usable TrueType/OpenType font: {message}")]
    Parse { origin: String, message: String },
}

/// Where a font asset is loaded from: an http(s) URL or a local file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    Url(Url),
    File(PathBuf),
}

impl FromStr for FontSource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        if value.is_empty() {
            return Err("font source must not be empty".to_string());
        }
        if value.starts_with("http://") || value.starts_with("https://") {
            return Url::parse(value)
                .map(Self::Url)
                .map_err(|err| format!("invalid font URL {value}: {err}"));
        }
        Ok(Self::File(PathBuf::from(value)))
    }
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One parsed font file plus the metrics needed to measure and place text.
#[derive(Clone)]
pub struct FontAsset {
    bytes: Arc<[u8]>,
    family: String,
    weight: u16,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
}

impl fmt::Debug for FontAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontAsset")
            .field("family", &self.family)
            .field("weight", &self.weight)
            .field("bytes", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

impl FontAsset {
    /// Parse `bytes` and register them with `database`. The family name and
    /// weight are taken from the database entry so the SVG can address the
    /// face exactly as the rasterizer will look it up.
    fn load(
        database: &mut fontdb::Database,
        origin: &str,
        bytes: Vec<u8>,
    ) -> Result<Self, FontError> {
        let parse_error = |message: String| FontError::Parse {
            origin: origin.to_string(),
            message,
        };

        let face =
            ttf_parser::Face::parse(&bytes, 0).map_err(|err| parse_error(err.to_string()))?;
        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();

        let before = database.len();
        database.load_font_data(bytes.clone());
        if database.len() == before {
            return Err(parse_error("font database rejected the face".to_string()));
        }

        let info = database
            .faces()
            .last()
            .ok_or_else(|| parse_error("font database is empty".to_string()))?;
        let family = info
            .families
            .first()
            .map(|(name, _)| name.clone())
            .ok_or_else(|| parse_error("face has no family name".to_string()))?;

        Ok(Self {
            family,
            weight: info.weight.0,
            units_per_em,
            ascender,
            descender,
            bytes: bytes.into(),
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn weight(&self) -> u16 {
        self.weight
    }

    fn scale(&self, size: f32) -> f32 {
        size / f32::from(self.units_per_em.max(1))
    }

    /// Horizontal extent of `text` set in `style`, including letter spacing.
    /// Characters missing from the font count as half an em.
    pub fn measure(&self, text: &str, style: &TextStyle) -> f32 {
        let Ok(face) = ttf_parser::Face::parse(&self.bytes, 0) else {
            return 0.0;
        };
        let scale = self.scale(style.size);

        let mut width = 0.0;
        let mut chars = 0u16;
        for c in text.chars() {
            let advance = face
                .glyph_index(c)
                .and_then(|glyph| face.glyph_hor_advance(glyph))
                .map_or(style.size / 2.0, |units| f32::from(units) * scale);
            width += advance;
            chars = chars.saturating_add(1);
        }
        width + style.letter_spacing * f32::from(chars)
    }

    /// Distance from the top of a line box to the baseline, with the font's
    /// ascent and descent centered in the box the way CSS does it.
    pub fn baseline_offset(&self, style: &TextStyle) -> f32 {
        let scale = self.scale(style.size);
        let ascent = f32::from(self.ascender) * scale;
        let descent = f32::from(self.descender) * scale;
        let content = ascent - descent;
        (style.line_box() - content) / 2.0 + ascent
    }
}

/// The two font assets a pin is typeset with, and the database the
/// rasterizer resolves them from.
pub struct FontSet {
    pub title: FontAsset,
    pub subtitle: FontAsset,
    pub database: Arc<fontdb::Database>,
}

impl FontSet {
    pub fn from_bytes(title: Vec<u8>, subtitle: Vec<u8>) -> Result<Self, FontError> {
        let mut database = fontdb::Database::new();
        let title = FontAsset::load(&mut database, "title", title)?;
        let subtitle = FontAsset::load(&mut database, "subtitle", subtitle)?;
        Ok(Self {
            title,
            subtitle,
            database: Arc::new(database),
        })
    }

    pub fn for_role(&self, role: FontRole) -> &FontAsset {
        match role {
            FontRole::Title => &self.title,
            FontRole::Subtitle => &self.subtitle,
        }
    }
}

/// Process-lifetime memo of the font assets.
///
/// Populated on first use and never evicted. Requests that race on a cold
/// cache each load the fonts; the first value stored wins and the other
/// copies, identical in content, are dropped.
pub struct FontCache {
    title: FontSource,
    subtitle: FontSource,
    fonts: OnceLock<Arc<FontSet>>,
}

impl FontCache {
    pub fn new(title: FontSource, subtitle: FontSource) -> Self {
        Self {
            title,
            subtitle,
            fonts: OnceLock::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.fonts.get().is_some()
    }

    pub async fn get(&self, client: &reqwest::Client) -> Result<Arc<FontSet>, FontError> {
        if let Some(fonts) = self.fonts.get() {
            return Ok(Arc::clone(fonts));
        }

        debug!(title = %self.title, subtitle = %self.subtitle, "loading fonts");
        let (title, subtitle) = futures::future::try_join(
            load_source(client, &self.title),
            load_source(client, &self.subtitle),
        )
        .await?;

        let fonts = Arc::new(FontSet::from_bytes(title, subtitle)?);
        if self.fonts.set(Arc::clone(&fonts)).is_ok() {
            info!(
                title = fonts.title.family(),
                subtitle = fonts.subtitle.family(),
                "fonts loaded"
            );
        }

        Ok(self.fonts.get().map_or(fonts, Arc::clone))
    }
}

async fn load_source(client: &reqwest::Client, source: &FontSource) -> Result<Vec<u8>, FontError> {
    match source {
        FontSource::Url(url) => fetch_font(client, url).await,
        FontSource::File(path) => tokio::fs::read(path).await.map_err(|err| FontError::Read {
            origin: source.to_string(),
            message: err.to_string(),
        }),
    }
}

async fn fetch_font(client: &reqwest::Client, url: &Url) -> Result<Vec<u8>, FontError> {
    let fetch_error = |message: String| FontError::Fetch {
        origin: url.to_string(),
        message,
    };

    let response = client
        .get(url.clone())
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .map_err(|err| fetch_error(err.to_string()))?;

    if !response.status().is_success() {
        return Err(fetch_error(format!("server returned {}", response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| fetch_error(err.to_string()))?;

    if bytes.is_empty() {
        return Err(fetch_error("empty response body".to_string()));
    }

    Ok(bytes.to_vec())
}

/// Bundled fonts for tests: Hack stands in for the title face and Ubuntu
/// Light for the subtitle face.
#[cfg(test)]
pub(crate) fn test_fonts() -> FontSet {
    FontSet::from_bytes(
        epaint_default_fonts::HACK_REGULAR.to_vec(),
        epaint_default_fonts::UBUNTU_LIGHT.to_vec(),
    )
    .expect("bundled test fonts should parse")
}

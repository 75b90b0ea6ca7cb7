use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use tracing::debug;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("unsupported image source {0:?}: expected an http(s) URL or a data URI")]
    UnsupportedSource(String),
    #[error("malformed data URI: {0}")]
    MalformedDataUri(String),
    #[error("failed to download {url}: {message}")]
    Download { url: String, message: String },
    #[error("image is empty")]
    Empty,
    #[error("image is not a PNG, JPEG, GIF or WebP file")]
    UnsupportedFormat,
}

/// Raster image bytes ready to be inlined into the vector document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub mime: &'static str,
    pub data: Vec<u8>,
}

impl EmbeddedImage {
    /// Sniff the format from the leading bytes; the declared type is ignored.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, ImageError> {
        if data.is_empty() {
            return Err(ImageError::Empty);
        }
        let format = image::guess_format(&data).map_err(|_| ImageError::UnsupportedFormat)?;
        let mime = match format {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            _ => return Err(ImageError::UnsupportedFormat),
        };
        Ok(Self { mime, data })
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.data))
    }
}

/// Resolve the pin's main image from a URL or data URI.
///
/// The image is always inlined so that the rasterizer never reaches out to
/// the network or the filesystem on its own.
pub async fn load_main_image(
    client: &reqwest::Client,
    source: &str,
) -> Result<EmbeddedImage, ImageError> {
    if let Some(rest) = source.strip_prefix("data:") {
        return EmbeddedImage::from_bytes(decode_data_uri(rest)?);
    }

    if source.starts_with("http://") || source.starts_with("https://") {
        let bytes = download(client, source).await?;
        return EmbeddedImage::from_bytes(bytes);
    }

    Err(ImageError::UnsupportedSource(truncate(source)))
}

/// Decode the part of a data URI after `data:`. Only base64 payloads are
/// accepted since raster images are binary.
fn decode_data_uri(rest: &str) -> Result<Vec<u8>, ImageError> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::MalformedDataUri("missing ',' separator".to_string()))?;

    if !header
        .split(';')
        .any(|param| param.trim().eq_ignore_ascii_case("base64"))
    {
        return Err(ImageError::MalformedDataUri(
            "payload must be base64 encoded".to_string(),
        ));
    }

    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(payload)
        .map_err(|err| ImageError::MalformedDataUri(err.to_string()))
}

async fn download(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, ImageError> {
    let download_error = |message: String| ImageError::Download {
        url: url.to_string(),
        message,
    };

    debug!(url, "downloading main image");
    let response = client
        .get(url)
        .timeout(DOWNLOAD_TIMEOUT)
        .send()
        .await
        .map_err(|err| download_error(err.to_string()))?;

    if !response.status().is_success() {
        return Err(download_error(format!("server returned {}", response.status())));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| download_error(err.to_string()))?;

    Ok(bytes.to_vec())
}

fn truncate(source: &str) -> String {
    const LIMIT: usize = 64;
    match source.char_indices().nth(LIMIT) {
        Some((index, _)) => format!("{}…", &source[..index]),
        None => source.to_string(),
    }
}

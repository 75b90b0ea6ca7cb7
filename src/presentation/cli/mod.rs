pub mod render;
pub mod request;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::domain::pins::{DEFAULT_MAIN_IMAGE, PinRequest};
use crate::infrastructure::fonts::{DEFAULT_SUBTITLE_FONT, DEFAULT_TITLE_FONT, FontSource};
use crate::infrastructure::images::EmbeddedImage;
use crate::infrastructure::renderer::RendererConfig;

#[derive(Debug, Parser)]
#[command(author, version, about = "Render Pinterest-style pin images", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeCommand),

    /// Render a pin to a local PNG file
    Render(RenderCommand),

    /// Ask a running server to render a pin
    Request(RequestCommand),
}

#[derive(Debug, Args)]
pub struct ServeCommand {
    #[arg(long, env = "PINRENDER_BIND_ADDRESS", default_value = "127.0.0.1:3000")]
    pub bind_address: SocketAddr,

    /// Shared secret expected in the X-KEY header of render requests
    #[arg(long, env = "PINRENDER_RENDER_KEY", default_value = "", hide_env_values = true)]
    pub render_key: String,

    /// Do not send CORS headers
    #[arg(long, env = "PINRENDER_DISABLE_CORS")]
    pub disable_cors: bool,

    #[command(flatten)]
    pub renderer: RendererArgs,
}

#[derive(Debug, Args)]
pub struct RenderCommand {
    #[command(flatten)]
    pub pin: PinArgs,

    #[command(flatten)]
    pub renderer: RendererArgs,

    #[arg(long, short, default_value = "pin.png")]
    pub output: PathBuf,

    /// Also write the intermediate SVG document to this path
    #[arg(long)]
    pub svg: Option<PathBuf>,

    /// Open the rendered file with the default viewer
    #[arg(long)]
    pub open: bool,
}

#[derive(Debug, Args)]
pub struct RequestCommand {
    #[arg(long, env = "PINRENDER_URL", default_value = "http://localhost:3000")]
    pub url: String,

    #[arg(long, env = "PINRENDER_RENDER_KEY", hide_env_values = true)]
    pub render_key: String,

    /// JSON payload file; flags below override its fields
    #[arg(long)]
    pub payload: Option<PathBuf>,

    #[command(flatten)]
    pub pin: PinArgs,

    #[arg(long, short, default_value = "pin.png")]
    pub output: PathBuf,

    /// Open the rendered file with the default viewer
    #[arg(long)]
    pub open: bool,
}

/// Pin fields; anything left unset takes the service default.
#[derive(Debug, Default, Args)]
pub struct PinArgs {
    /// http(s) URL or data: URI of the main image ("" for the placeholder)
    #[arg(long)]
    pub main_image: Option<String>,

    /// Local PNG, JPEG, GIF or WebP file to embed as the main image
    #[arg(long, conflicts_with = "main_image")]
    pub main_image_file: Option<PathBuf>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub subtitle: Option<String>,

    /// Band color: hex, a CSS color name, rgb() or hsl()
    #[arg(long)]
    pub color: Option<String>,
}

impl PinArgs {
    pub async fn apply_to(self, request: &mut PinRequest) -> anyhow::Result<()> {
        if let Some(path) = &self.main_image_file {
            request.main_image = Some(read_image_file(path).await?);
        }
        if let Some(main_image) = self.main_image {
            request.main_image = Some(main_image);
        }
        if let Some(title) = self.title {
            request.title = Some(title);
        }
        if let Some(subtitle) = self.subtitle {
            request.subtitle = Some(subtitle);
        }
        if let Some(color) = self.color {
            request.color = Some(color);
        }
        Ok(())
    }

    pub async fn into_request(self) -> anyhow::Result<PinRequest> {
        let mut request = PinRequest::default();
        self.apply_to(&mut request).await?;
        Ok(request)
    }
}

/// Read a local image and turn it into a `data:` URI.
async fn read_image_file(path: &Path) -> anyhow::Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let image = EmbeddedImage::from_bytes(bytes)
        .with_context(|| format!("unusable image {}", path.display()))?;
    Ok(image.data_uri())
}

#[derive(Debug, Args)]
pub struct RendererArgs {
    /// Title font, as an http(s) URL or a path to a TTF/OTF file
    #[arg(long, env = "PINRENDER_TITLE_FONT", default_value = DEFAULT_TITLE_FONT)]
    pub title_font: FontSource,

    /// Subtitle font, as an http(s) URL or a path to a TTF/OTF file
    #[arg(long, env = "PINRENDER_SUBTITLE_FONT", default_value = DEFAULT_SUBTITLE_FONT)]
    pub subtitle_font: FontSource,

    /// Main image used when a request does not name one
    #[arg(long, env = "PINRENDER_DEFAULT_IMAGE_URL", default_value = DEFAULT_MAIN_IMAGE)]
    pub default_image_url: String,
}

impl From<RendererArgs> for RendererConfig {
    fn from(args: RendererArgs) -> Self {
        Self {
            title_font: args.title_font,
            subtitle_font: args.subtitle_font,
            default_image_url: args.default_image_url,
        }
    }
}

pub(crate) async fn write_output(path: &Path, bytes: &[u8], open: bool) -> anyhow::Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("Wrote {} ({} bytes)", path.display(), bytes.len());

    if open {
        open::that(path).with_context(|| format!("failed to open {}", path.display()))?;
    }
    Ok(())
}

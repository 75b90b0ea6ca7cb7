use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Url, header};

use crate::application::auth::RENDER_KEY_HEADER;
use crate::application::errors::ErrorResponse;
use crate::domain::pins::PinRequest;

/// HTTP client for a running pin image service.
pub struct PinClient {
    base_url: Url,
    http: Client,
    render_key: String,
}

impl PinClient {
    pub fn new(base_url: Url, render_key: String) -> Result<Self> {
        let mut normalized = base_url;
        if !normalized.path().ends_with('/') {
            normalized.set_path(&format!("{}/", normalized.path().trim_end_matches('/')));
        }

        let http = Client::builder()
            .user_agent(concat!("pinrender-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to configure HTTP client")?;

        Ok(Self {
            base_url: normalized,
            http,
            render_key,
        })
    }

    pub fn from_base_url(base_url: &str, render_key: String) -> Result<Self> {
        let url = Url::parse(base_url).with_context(|| format!("invalid API url: {base_url}"))?;
        Self::new(url, render_key)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid API path: {path}"))
    }

    /// POST `request` to `/render` and return the PNG bytes.
    pub async fn render(&self, request: &PinRequest) -> Result<Vec<u8>> {
        let url = self.endpoint("render")?;
        let response = self
            .http
            .post(url)
            .header(RENDER_KEY_HEADER, &self.render_key)
            .json(request)
            .send()
            .await
            .context("failed to reach render service")?;

        if !response.status().is_success() {
            return Err(response_error(response).await);
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(anyhow!(
                "render service returned {content_type:?} instead of an image"
            ));
        }

        let bytes = response
            .bytes()
            .await
            .context("failed to read rendered image")?;
        Ok(bytes.to_vec())
    }
}

async fn response_error(response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let bytes = response.bytes().await.unwrap_or_default();

    if let Ok(err) = serde_json::from_slice::<ErrorResponse>(&bytes) {
        return anyhow!("request failed ({status}): {}", err.message);
    }

    let message = String::from_utf8_lossy(&bytes);
    anyhow!("request failed ({status}): {message}")
}

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use pinrender::application::routes::app_router;
use pinrender::application::state::{AppState, AppStateConfig};
use pinrender::infrastructure::fonts::FontSource;
use pinrender::infrastructure::renderer::RendererConfig;
use tokio::net::TcpListener;
use tokio::task::AbortHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const RENDER_KEY: &str = "test-render-key";

/// Fill color of the image served as the default main image.
pub const PHOTO_COLOR: [u8; 4] = [30, 90, 200, 255];

pub struct TestApp {
    pub address: String,
    pub mock_server: MockServer,
    server_handle: AbortHandle,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn asset_url(&self, path: &str) -> String {
        format!("{}{}", self.mock_server.uri(), path)
    }

    pub async fn post_render(&self, body: serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(self.url("/render"))
            .header("X-KEY", RENDER_KEY)
            .json(&body)
            .send()
            .await
            .expect("failed to send render request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

pub struct TestOptions {
    pub allow_any_origin: bool,
    /// Exact number of times each font may be downloaded, if checked.
    pub expected_font_fetches: Option<u64>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            allow_any_origin: true,
            expected_font_fetches: None,
        }
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(TestOptions::default()).await
}

pub async fn spawn_app_with(options: TestOptions) -> TestApp {
    let mock_server = MockServer::start().await;
    mount_assets(&mock_server, options.expected_font_fetches).await;

    let uri = mock_server.uri();
    let state = AppState::new(AppStateConfig {
        renderer: RendererConfig {
            title_font: font_source(&format!("{uri}/fonts/title.ttf")),
            subtitle_font: font_source(&format!("{uri}/fonts/subtitle.ttf")),
            default_image_url: format!("{uri}/images/photo.png"),
        },
        render_key: RENDER_KEY.to_string(),
        allow_any_origin: options.allow_any_origin,
    })
    .expect("Failed to build app state");

    let app = app_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");

    let local_addr = listener.local_addr().expect("Failed to get local address");
    let address = format!("http://{local_addr}");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Server failed to start");
    })
    .abort_handle();

    TestApp {
        address,
        mock_server,
        server_handle,
    }
}

fn font_source(url: &str) -> FontSource {
    url.parse().expect("valid font URL")
}

async fn mount_assets(server: &MockServer, expected_font_fetches: Option<u64>) {
    let fonts = [
        ("/fonts/title.ttf", epaint_default_fonts::HACK_REGULAR),
        ("/fonts/subtitle.ttf", epaint_default_fonts::UBUNTU_LIGHT),
    ];
    for (font_path, bytes) in fonts {
        let mock = Mock::given(method("GET"))
            .and(path(font_path))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "font/ttf")
                    .set_body_bytes(bytes.to_vec()),
            );
        let mock = match expected_font_fetches {
            Some(count) => mock.expect(count),
            None => mock,
        };
        mock.mount(server).await;
    }

    Mock::given(method("GET"))
        .and(path("/images/photo.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(solid_png(40, 60, PHOTO_COLOR)),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/images/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/images/not-an-image"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(server)
        .await;
}

/// Encode a `width`×`height` PNG filled with `color`.
pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba(color));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("failed to encode test PNG");
    buf.into_inner()
}

pub fn decode_png(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .expect("response should be a PNG")
        .to_rgba8()
}

/// Asserts each channel of `pixel` is within `tolerance` of `expected`.
pub fn assert_pixel_near(image: &RgbaImage, x: u32, y: u32, expected: [u8; 4], tolerance: u8) {
    let actual = image.get_pixel(x, y).0;
    let close = actual
        .iter()
        .zip(expected)
        .all(|(a, e)| a.abs_diff(e) <= tolerance);
    assert!(
        close,
        "pixel ({x}, {y}) is {actual:?}, expected {expected:?} ± {tolerance}"
    );
}

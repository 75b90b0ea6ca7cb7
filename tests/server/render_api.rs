use serde_json::{Value, json};

use crate::helpers::{
    PHOTO_COLOR, RENDER_KEY, TestOptions, assert_pixel_near, decode_png, spawn_app, spawn_app_with,
};

const DEFAULT_BAND: [u8; 4] = [0x5B, 0x3A, 0x1D, 255];
const PLACEHOLDER: [u8; 4] = [0xE7, 0xE2, 0xDC, 255];

/// A point inside the band, below the text column.
const BAND_PROBE: (u32, u32) = (100, 1490);
/// A point inside the image region, away from the placeholder label.
const IMAGE_PROBE: (u32, u32) = (200, 300);

async fn error_message(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("error body should be JSON");
    body["message"]
        .as_str()
        .expect("error body should carry a message")
        .to_string()
}

// ===========================================================================
// Rendering
// ===========================================================================

#[tokio::test]
async fn empty_payload_renders_the_default_pin() {
    let app = spawn_app().await;

    let response = app.post_render(json!({})).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "image/png");

    let bytes = response.bytes().await.unwrap();
    let image = decode_png(&bytes);
    assert_eq!(image.dimensions(), (1000, 1500));

    // Rounded corners are transparent.
    assert_eq!(image.get_pixel(0, 0).0[3], 0);
    assert_eq!(image.get_pixel(999, 1499).0[3], 0);

    assert_pixel_near(&image, BAND_PROBE.0, BAND_PROBE.1, DEFAULT_BAND, 1);
    assert_pixel_near(&image, IMAGE_PROBE.0, IMAGE_PROBE.1, PHOTO_COLOR, 2);
}

#[tokio::test]
async fn custom_fields_are_rendered() {
    let app = spawn_app().await;

    let response = app
        .post_render(json!({
            "title": "pasta night",
            "subtitle": "Weeknight dinners",
            "color": "#112233",
        }))
        .await;
    assert_eq!(response.status(), 200);

    let image = decode_png(&response.bytes().await.unwrap());
    assert_pixel_near(
        &image,
        BAND_PROBE.0,
        BAND_PROBE.1,
        [0x11, 0x22, 0x33, 255],
        1,
    );
}

#[tokio::test]
async fn css_color_names_and_functions_are_accepted() {
    let app = spawn_app().await;

    for (color, expected) in [
        ("white", [255, 255, 255, 255]),
        ("rgb(91,58,29)", DEFAULT_BAND),
    ] {
        let response = app.post_render(json!({ "color": color })).await;
        assert_eq!(response.status(), 200, "{color} should render");

        let image = decode_png(&response.bytes().await.unwrap());
        assert_pixel_near(&image, BAND_PROBE.0, BAND_PROBE.1, expected, 1);
    }
}

#[tokio::test]
async fn control_characters_in_text_still_render() {
    let app = spawn_app().await;

    let response = app
        .post_render(json!({
            "title": "Bake\u{0001}Recipes",
            "subtitle": "Tabs\tand\u{000B}feeds\u{FFFF}",
        }))
        .await;
    assert_eq!(response.status(), 200);

    let image = decode_png(&response.bytes().await.unwrap());
    assert_eq!(image.dimensions(), (1000, 1500));
}

#[tokio::test]
async fn empty_subtitle_still_renders() {
    let app = spawn_app().await;

    let response = app
        .post_render(json!({ "title": "Only a title", "subtitle": "" }))
        .await;
    assert_eq!(response.status(), 200);

    let image = decode_png(&response.bytes().await.unwrap());
    assert_eq!(image.dimensions(), (1000, 1500));
}

#[tokio::test]
async fn empty_main_image_renders_placeholder() {
    let app = spawn_app().await;

    let response = app.post_render(json!({ "main_image": "" })).await;
    assert_eq!(response.status(), 200);

    let image = decode_png(&response.bytes().await.unwrap());
    assert_pixel_near(&image, IMAGE_PROBE.0, IMAGE_PROBE.1, PLACEHOLDER, 1);
}

#[tokio::test]
async fn explicit_image_url_is_fetched() {
    let app = spawn_app().await;

    let response = app
        .post_render(json!({ "main_image": app.asset_url("/images/photo.png") }))
        .await;
    assert_eq!(response.status(), 200);

    let image = decode_png(&response.bytes().await.unwrap());
    assert_pixel_near(&image, IMAGE_PROBE.0, IMAGE_PROBE.1, PHOTO_COLOR, 2);
}

#[tokio::test]
async fn translucent_band_blends_with_canvas() {
    let app = spawn_app().await;

    let response = app.post_render(json!({ "color": "#FF000080" })).await;
    assert_eq!(response.status(), 200);

    let image = decode_png(&response.bytes().await.unwrap());
    assert_pixel_near(&image, BAND_PROBE.0, BAND_PROBE.1, [255, 127, 127, 255], 2);
}

#[tokio::test]
async fn rendering_is_deterministic() {
    let app = spawn_app().await;
    let payload = json!({ "title": "Same", "subtitle": "Every time", "color": "#336699" });

    let first = app.post_render(payload.clone()).await.bytes().await.unwrap();
    let second = app.post_render(payload).await.bytes().await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn malformed_json_falls_back_to_defaults() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(app.url("/render"))
        .header("X-KEY", RENDER_KEY)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let image = decode_png(&response.bytes().await.unwrap());
    assert_pixel_near(&image, BAND_PROBE.0, BAND_PROBE.1, DEFAULT_BAND, 1);
}

#[tokio::test]
async fn unsupported_format_still_returns_png() {
    let app = spawn_app().await;

    let response = app.post_render(json!({ "format": "jpeg" })).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "image/png");
}

#[tokio::test]
async fn response_headers_mark_an_attachment() {
    let app = spawn_app().await;

    let response = app.post_render(json!({})).await;
    assert_eq!(response.status(), 200);

    let headers = response.headers();
    assert_eq!(
        headers["content-disposition"],
        "attachment; filename=\"pin.png\""
    );
    assert_eq!(headers["cache-control"], "no-store");
    assert_eq!(headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn fonts_are_fetched_once() {
    let app = spawn_app_with(TestOptions {
        expected_font_fetches: Some(1),
        ..TestOptions::default()
    })
    .await;

    for title in ["first", "second", "third"] {
        let response = app.post_render(json!({ "title": title })).await;
        assert_eq!(response.status(), 200);
    }

    app.mock_server.verify().await;
}

#[tokio::test]
async fn concurrent_cold_requests_agree() {
    let app = spawn_app().await;
    let payload = json!({ "title": "Race", "subtitle": "Cold cache", "color": "#336699" });

    let responses = futures::future::join_all(
        (0..4).map(|_| app.post_render(payload.clone())),
    )
    .await;

    let mut bodies = Vec::new();
    for response in responses {
        assert_eq!(response.status(), 200);
        bodies.push(response.bytes().await.unwrap());
    }
    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
}

// ===========================================================================
// Errors
// ===========================================================================

#[tokio::test]
async fn missing_key_is_unauthorized() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(app.url("/render"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    assert_eq!(error_message(response).await, "Unauthorized: invalid X-KEY");
}

#[tokio::test]
async fn wrong_key_is_unauthorized() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .post(app.url("/render"))
        .header("X-KEY", "not-the-key")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn key_is_checked_before_method() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let anonymous = client.get(app.url("/render")).send().await.unwrap();
    assert_eq!(anonymous.status(), 401);

    let authorized = client
        .get(app.url("/render"))
        .header("X-KEY", RENDER_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(authorized.status(), 405);
    assert_eq!(error_message(authorized).await, "Method Not Allowed");
}

#[tokio::test]
async fn invalid_color_is_a_validation_error() {
    let app = spawn_app().await;

    let response = app.post_render(json!({ "color": "not-a-color" })).await;
    assert_eq!(response.status(), 400);
    assert!(error_message(response).await.contains("invalid color"));
}

#[tokio::test]
async fn unreachable_image_is_a_render_failure() {
    let app = spawn_app().await;

    let response = app
        .post_render(json!({ "main_image": app.asset_url("/images/missing.png") }))
        .await;
    assert_eq!(response.status(), 500);
    assert!(error_message(response).await.starts_with("Render failed:"));
}

#[tokio::test]
async fn non_image_content_is_a_render_failure() {
    let app = spawn_app().await;

    let response = app
        .post_render(json!({ "main_image": app.asset_url("/images/not-an-image") }))
        .await;
    assert_eq!(response.status(), 500);
    assert!(error_message(response).await.starts_with("Render failed:"));
}

#[tokio::test]
async fn unsupported_image_scheme_is_a_render_failure() {
    let app = spawn_app().await;

    let response = app
        .post_render(json!({ "main_image": "ftp://example.com/photo.png" }))
        .await;
    assert_eq!(response.status(), 500);
}

// ===========================================================================
// CORS & health
// ===========================================================================

#[tokio::test]
async fn preflight_is_answered_without_a_key() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, app.url("/render"))
        .header("Origin", "https://designer.example.com")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type, x-key")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn cors_headers_can_be_disabled() {
    let app = spawn_app_with(TestOptions {
        allow_any_origin: false,
        ..TestOptions::default()
    })
    .await;

    let response = reqwest::Client::new()
        .post(app.url("/render"))
        .header("Origin", "https://designer.example.com")
        .header("X-KEY", RENDER_KEY)
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(
        response
            .headers()
            .get("access-control-allow-origin")
            .is_none()
    );
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = spawn_app().await;

    let response = reqwest::get(app.url("/healthz")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use crate::application::auth::Authorized;
use crate::application::errors::{ApiError, AppError};
use crate::application::state::AppState;
use crate::domain::pins::PinRequest;

/// `POST /render`: render the pin described by the JSON body to PNG.
#[tracing::instrument(skip_all)]
pub(crate) async fn render_pin(
    State(state): State<AppState>,
    _auth: Authorized,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = parse_payload(&body);

    if request.requests_unsupported_format() {
        info!(
            format = request.format.as_deref().unwrap_or_default(),
            "unsupported output format requested, rendering PNG"
        );
    }

    let spec = request.resolve(state.renderer.default_image_url())?;
    info!(
        title = %spec.title,
        color = %spec.color,
        has_subtitle = spec.subtitle.is_some(),
        "rendering pin"
    );

    let rendered = state.renderer.render(&spec).await?;

    Ok((
        [
            (header::CONTENT_TYPE, rendered.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", rendered.format.file_name()),
            ),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        rendered.bytes,
    )
        .into_response())
}

/// Any other method on `/render`. The key is still checked first, so an
/// unauthenticated caller learns nothing about the route.
pub(crate) async fn method_not_allowed(_auth: Authorized) -> ApiError {
    AppError::MethodNotAllowed.into()
}

/// Parse the request body leniently: an empty or malformed body is treated as
/// an empty payload so that every field takes its default.
pub(crate) fn parse_payload(body: &[u8]) -> PinRequest {
    if body.iter().all(u8::is_ascii_whitespace) {
        return PinRequest::default();
    }

    serde_json::from_slice(body).unwrap_or_else(|err| {
        warn!(error = %err, "malformed render payload, using defaults");
        PinRequest::default()
    })
}

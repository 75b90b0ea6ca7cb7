use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use serde::Deserialize;

use crate::application::routes::render_html;
use crate::application::state::AppState;
use crate::domain::layout::PinLayout;
use crate::domain::pins::PinRequest;
use crate::presentation::web::templates::PreviewTemplate;
use crate::presentation::web::views::{PREVIEW_SCALE, PinFormView, PinPreviewView};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PreviewQuery {
    main_image: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    color: Option<String>,
}

/// `GET /`: live preview of the pin for the values in the query string.
///
/// An unparseable color falls back to the default and is reported on the
/// page instead of failing the request.
#[tracing::instrument(skip_all)]
pub(crate) async fn preview_page(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> Result<Html<String>, StatusCode> {
    let request = PinRequest {
        main_image: query.main_image,
        color: query.color,
        title: query.title,
        subtitle: query.subtitle,
        format: None,
    };
    let default_image = state.renderer.default_image_url();

    let (spec, notice) = match request.clone().resolve(default_image) {
        Ok(spec) => (spec, None),
        Err(err) => {
            let fallback = PinRequest {
                color: None,
                ..request.clone()
            };
            let spec = fallback
                .resolve(default_image)
                .map_err(|_| StatusCode::BAD_REQUEST)?;
            (spec, Some(err.to_string()))
        }
    };

    let payload_json = serde_json::to_string_pretty(&PinRequest {
        format: Some(spec.format.to_string()),
        ..request.clone()
    })
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let layout = PinLayout::new(&spec);
    render_html(PreviewTemplate {
        pin: PinPreviewView::new(&layout, PREVIEW_SCALE),
        form: PinFormView::new(&request, &spec),
        notice,
        payload_json,
    })
}

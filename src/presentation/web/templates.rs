pub use askama::Template;

use super::views::{PinFormView, PinPreviewView};

#[derive(Template)]
#[template(path = "preview.html")]
pub struct PreviewTemplate {
    pub pin: PinPreviewView,
    pub form: PinFormView,
    pub notice: Option<String>,
    pub payload_json: String,
}

pub fn render_template<T: Template>(template: T) -> askama::Result<String> {
    template.render()
}

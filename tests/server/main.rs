mod helpers;
mod render_api;

use genpdf::fonts::{FontData, FontFamily};

use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Renderer font family, loaded once at startup and cloned per render.
    pub fonts: FontFamily<FontData>,
}

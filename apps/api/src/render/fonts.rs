//! Font discovery for the renderer.
//!
//! `genpdf` needs a TTF family on disk. The four Roboto weights are expected
//! in a directory resolved from `CV_FONTS_DIR`, falling back to the bundled
//! `assets/fonts` next to the crate manifest (see assets/fonts/README.md for
//! how to populate it).

use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{self, FontData, FontFamily};

/// Name prefix of the font files the renderer loads.
pub const FONT_FAMILY_NAME: &str = "Roboto";

const FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

/// Font directory: `CV_FONTS_DIR` if set, otherwise `assets/fonts` next to
/// the crate manifest.
pub fn default_font_dir() -> PathBuf {
    std::env::var("CV_FONTS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"))
}

/// Whether all four weights exist under `dir`.
pub fn fonts_available(dir: &Path) -> bool {
    FONT_FILES.iter().all(|name| dir.join(name).is_file())
}

/// Loads the font family from `dir`, with a setup hint on failure.
pub fn load_font_family(dir: &Path) -> Result<FontFamily<FontData>, Error> {
    if !fonts_available(dir) {
        return Err(Error::new(
            format!(
                "Font files missing under {} (expected {}); see assets/fonts/README.md",
                dir.display(),
                FONT_FILES.join(", ")
            ),
            io::Error::new(io::ErrorKind::NotFound, "font files not found"),
        ));
    }
    fonts::from_files(dir, FONT_FAMILY_NAME, None)
}

//! Theme colors for the rendered document.
//!
//! Callers may override the header and body colors per request; everything
//! else derives from these two values. Overrides are resolved against the
//! defaults once, at model build time, instead of being defaulted at each
//! drawing call site.

use serde::Serialize;
use tracing::warn;

/// Default header color.
pub const DEFAULT_HEADER: Rgb = Rgb {
    r: 0x00,
    g: 0x7b,
    b: 0xff,
};

/// Default body text color (black).
pub const DEFAULT_TEXT: Rgb = Rgb { r: 0, g: 0, b: 0 };

/// A plain RGB triple, independent of the PDF crate's color types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parses `#RRGGBB`; the leading `#` is optional.
    pub fn parse_hex(input: &str) -> Option<Rgb> {
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Rgb {
            r: u8::from_str_radix(&hex[0..2], 16).ok()?,
            g: u8::from_str_radix(&hex[2..4], 16).ok()?,
            b: u8::from_str_radix(&hex[4..6], 16).ok()?,
        })
    }
}

impl From<Rgb> for genpdf::style::Color {
    fn from(rgb: Rgb) -> Self {
        genpdf::style::Color::Rgb(rgb.r, rgb.g, rgb.b)
    }
}

/// The two colors a render works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Theme {
    /// Header band, section headings, and separator rules.
    pub header: Rgb,
    /// Contact lines and record titles.
    pub text: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            header: DEFAULT_HEADER,
            text: DEFAULT_TEXT,
        }
    }
}

impl Theme {
    /// Resolves caller overrides against the defaults. Malformed values are
    /// dropped with a warning rather than failing the request.
    pub fn resolve(header: Option<&str>, text: Option<&str>) -> Theme {
        Theme {
            header: resolve_color(header, DEFAULT_HEADER, "headerColor"),
            text: resolve_color(text, DEFAULT_TEXT, "textColor"),
        }
    }
}

fn resolve_color(value: Option<&str>, default: Rgb, field: &str) -> Rgb {
    match value {
        None => default,
        Some(raw) => Rgb::parse_hex(raw).unwrap_or_else(|| {
            warn!("Ignoring malformed {field} value '{raw}'");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_and_without_hash() {
        let expected = Rgb {
            r: 0x22,
            g: 0x22,
            b: 0x22,
        };
        assert_eq!(Rgb::parse_hex("#222222"), Some(expected));
        assert_eq!(Rgb::parse_hex("222222"), Some(expected));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(Rgb::parse_hex("#22"), None);
        assert_eq!(Rgb::parse_hex("#22FG34"), None);
        assert_eq!(Rgb::parse_hex("bleu"), None);
        assert_eq!(Rgb::parse_hex(""), None);
    }

    #[test]
    fn resolve_defaults_when_no_overrides() {
        let theme = Theme::resolve(None, None);
        assert_eq!(theme.header, DEFAULT_HEADER);
        assert_eq!(theme.text, DEFAULT_TEXT);
    }

    #[test]
    fn resolve_keeps_valid_overrides_and_drops_bad_ones() {
        let theme = Theme::resolve(Some("#222222"), Some("not-a-color"));
        assert_eq!(
            theme.header,
            Rgb {
                r: 0x22,
                g: 0x22,
                b: 0x22
            }
        );
        assert_eq!(theme.text, DEFAULT_TEXT);
    }
}

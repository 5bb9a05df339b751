//! Custom `genpdf` elements for the CV layout: the filled title band, the
//! underlined section heading, and the thin separator rule.
//!
//! `genpdf` ships neither a filled rectangle nor an underline primitive, so
//! the band is a solid-color image stretched to size and the underline is a
//! stroke drawn under the measured text width.

use genpdf::error::Error;
use genpdf::style::{Style, StyledString};
use genpdf::{render, Context, Element, Mm, Position, RenderResult, Scale, Size};
use image::GenericImageView;

use crate::render::theme::Rgb;

const MM_PER_INCH: f64 = 25.4;
/// DPI genpdf assumes when sizing images.
const IMAGE_DPI: f64 = 300.0;
const UNDERLINE_OFFSET_MM: f64 = 0.6;

pub(crate) fn mm(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_value(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

/// Natural size of `image` on paper, in millimetres.
fn natural_size(image: &image::DynamicImage) -> (f64, f64) {
    let (px_w, px_h) = image.dimensions();
    (
        MM_PER_INCH * px_w as f64 / IMAGE_DPI,
        MM_PER_INCH * px_h as f64 / IMAGE_DPI,
    )
}

/// Builds an image element scaled uniformly so it fits a `box_mm` square
/// without distortion.
pub fn boxed_image(
    image: &image::DynamicImage,
    box_mm: f64,
) -> Result<genpdf::elements::Image, Error> {
    let (nat_w, nat_h) = natural_size(image);
    let mut element = genpdf::elements::Image::from_dynamic_image(image.clone())?;
    let scale = (box_mm / nat_w).min(box_mm / nat_h);
    element.set_scale(Scale::new(scale, scale));
    Ok(element)
}

/// Builds a solid-color image stretched to `width_mm` × `height_mm`, used as
/// the filled title band.
pub fn color_bar(
    color: Rgb,
    width_mm: f64,
    height_mm: f64,
) -> Result<genpdf::elements::Image, Error> {
    let pixel = image::Rgb([color.r, color.g, color.b]);
    let bar = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, pixel));
    let (nat_w, nat_h) = natural_size(&bar);
    let mut element = genpdf::elements::Image::from_dynamic_image(bar)?;
    element.set_scale(Scale::new(width_mm / nat_w, height_mm / nat_h));
    Ok(element)
}

/// A single line of text with a stroke drawn underneath, in the text's color.
pub struct UnderlinedHeading {
    text: StyledString,
    underline_offset: Mm,
}

impl UnderlinedHeading {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: StyledString::new(text.into(), style),
            underline_offset: mm(UNDERLINE_OFFSET_MM),
        }
    }
}

impl Element for UnderlinedHeading {
    fn render(
        &mut self,
        context: &Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut string = self.text.clone();
        string.style = style.and(string.style);

        let line_height = string.style.line_height(&context.font_cache);
        let mut result = RenderResult::default();
        if line_height + self.underline_offset > area.size().height {
            result.has_more = true;
            return Ok(result);
        }

        let width = string.width(&context.font_cache);
        let glyph_height = string
            .style
            .font(&context.font_cache)
            .glyph_height(string.style.font_size());

        if let Some(mut section) = area.text_section(&context.font_cache, Position::new(0, 0), style)
        {
            section.print_str(&string.s, string.style)?;
        } else {
            result.has_more = true;
            return Ok(result);
        }

        let baseline = glyph_height + self.underline_offset;
        let mut line_style = Style::new();
        if let Some(color) = string.style.color() {
            line_style = line_style.with_color(color);
        }
        area.draw_line(
            vec![Position::new(0, baseline), Position::new(width, baseline)],
            line_style,
        );

        result.size = Size::new(width, line_height + self.underline_offset);
        Ok(result)
    }
}

/// A thin horizontal rule across the full content width.
pub struct HorizontalRule {
    color: Rgb,
    /// Vertical room the rule consumes.
    spacing: Mm,
}

impl HorizontalRule {
    pub fn new(color: Rgb) -> Self {
        Self {
            color,
            spacing: mm(2.0),
        }
    }
}

impl Element for HorizontalRule {
    fn render(
        &mut self,
        _context: &Context,
        mut area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        if self.spacing > area.size().height {
            result.has_more = true;
            return Ok(result);
        }

        let y = self.spacing / 2.0;
        let width = area.size().width;
        area.draw_line(
            vec![Position::new(0, y), Position::new(width, y)],
            Style::new().with_color(self.color.into()),
        );

        result.size = Size::new(width, self.spacing);
        Ok(result)
    }
}

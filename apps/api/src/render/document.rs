//! Layout engine for the CV document.
//!
//! The first page opens with a full-width filled band carrying the name and
//! the optional photo inset; contact lines and the sections flow underneath.
//! Pagination is implicit: elements that no longer fit continue on a fresh
//! page that carries only the margins, not the band.

use std::io::{self, Write as _};

use genpdf::elements::{Break, Paragraph, UnorderedList};
use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Color, Style};
use genpdf::{render, Alignment, Context, Element, Margins, Mm, PageDecorator, Position};

use crate::cv::model::{CvModel, TemplateFeatures, TemplateVariant, TimelineEntry};
use crate::render::elements::{self, mm, mm_value, HorizontalRule, UnderlinedHeading};
use crate::render::theme::{Rgb, Theme};

// ────────────────────────────────────────────────────────────────────────────
// Layout constants
// ────────────────────────────────────────────────────────────────────────────

const PT_TO_MM: f64 = 25.4 / 72.0;

/// Uniform page margin (50 pt).
const PAGE_MARGIN_MM: f64 = 50.0 * PT_TO_MM;
/// Height of the filled title band (90 pt).
const BAND_HEIGHT_MM: f64 = 90.0 * PT_TO_MM;
/// Bounding box of the photo inset (100 pt square).
const PHOTO_BOX_MM: f64 = 100.0 * PT_TO_MM;
/// Gap between the band's lower edge and the first content line.
const BAND_CONTENT_GAP_MM: f64 = 4.0;

const NAME_SIZE: u8 = 24;
const CONTACT_SIZE: u8 = 12;
const HEADING_SIZE: u8 = 16;
const RECORD_TITLE_SIZE: u8 = 12;
const BODY_SIZE: u8 = 11;

/// Tone used for record descriptions, regardless of the text color override.
const MUTED: Rgb = Rgb {
    r: 0x55,
    g: 0x55,
    b: 0x55,
};

// ────────────────────────────────────────────────────────────────────────────
// Renderer
// ────────────────────────────────────────────────────────────────────────────

/// Renders a `CvModel` into a PDF, configured by a template variant.
pub struct Renderer {
    fonts: FontFamily<FontData>,
    features: TemplateFeatures,
}

impl Renderer {
    pub fn new(fonts: FontFamily<FontData>, variant: TemplateVariant) -> Self {
        Self {
            fonts,
            features: variant.features(),
        }
    }

    /// Renders `model` as a complete PDF into `writer`. The writer sees the
    /// finished byte stream; nothing is written on failure before the first
    /// page is laid out.
    pub fn render_into<W: io::Write>(&self, model: &CvModel, writer: W) -> Result<(), Error> {
        let document = self.document(model)?;
        let mut writer = io::BufWriter::with_capacity(64 * 1024, writer);
        document.render(&mut writer)?;
        writer
            .flush()
            .map_err(|err| Error::new("flushing rendered PDF", err))
    }

    fn effective_theme(&self, model: &CvModel) -> Theme {
        if self.features.theme_overrides {
            model.theme
        } else {
            Theme::default()
        }
    }

    fn document(&self, model: &CvModel) -> Result<genpdf::Document, Error> {
        let theme = self.effective_theme(model);

        let mut doc = genpdf::Document::new(self.fonts.clone());
        doc.set_title(format!("CV - {}", model.full_name()));
        doc.set_paper_size(genpdf::PaperSize::A4);

        let photo = match &model.photo {
            Some(image) => {
                let mut inset = elements::boxed_image(image, PHOTO_BOX_MM)?;
                inset.set_alignment(Alignment::Right);
                Some(inset)
            }
            None => None,
        };
        doc.set_page_decorator(CvPageDecorator::new(
            mm(PAGE_MARGIN_MM),
            Banner {
                color: theme.header,
                height: mm(BAND_HEIGHT_MM),
                name: model.full_name(),
                photo,
            },
        ));

        self.push_contact(&mut doc, model, &theme);
        self.push_sections(&mut doc, model, &theme);

        Ok(doc)
    }

    fn push_contact(&self, doc: &mut genpdf::Document, model: &CvModel, theme: &Theme) {
        let style = Style::new()
            .with_font_size(CONTACT_SIZE)
            .with_color(theme.text.into());
        doc.push(Paragraph::new(format!("Address: {}", model.address)).styled(style));
        doc.push(Paragraph::new(format!("Email: {}", model.email)).styled(style));
        if let Some(phone) = &model.phone {
            doc.push(Paragraph::new(format!("Phone: {phone}")).styled(style));
        }
    }

    fn push_sections(&self, doc: &mut genpdf::Document, model: &CvModel, theme: &Theme) {
        let mut sections = Vec::new();
        if self.features.extended_sections {
            if let Some(summary) = model.summary.as_deref() {
                sections.push(Section::text("Profile", summary));
            }
        }
        sections.push(Section::records("Professional Experience", &model.experience));
        sections.push(Section::records("Education", &model.education));
        sections.push(Section::list("Skills", &model.skills));
        if self.features.extended_sections {
            sections.push(Section::list("Certifications", &model.certifications));
        }
        sections.push(Section::list("Hobbies", &model.hobbies));

        for section in sections.into_iter().filter(|s| !s.is_empty()) {
            self.push_section(doc, section, theme);
        }
    }

    fn push_section(&self, doc: &mut genpdf::Document, section: Section<'_>, theme: &Theme) {
        doc.push(HorizontalRule::new(theme.header));

        let heading_style = Style::new()
            .bold()
            .with_font_size(HEADING_SIZE)
            .with_color(theme.header.into());
        doc.push(UnderlinedHeading::new(section.title, heading_style));
        doc.push(Break::new(0.5));

        let body_style = Style::new()
            .with_font_size(BODY_SIZE)
            .with_color(theme.text.into());
        match section.body {
            SectionBody::Text(text) => {
                doc.push(Paragraph::new(text.to_string()).styled(body_style));
            }
            SectionBody::List(items) => {
                let mut list = UnorderedList::new();
                for item in items {
                    list.push(Paragraph::new(item.clone()).styled(body_style));
                }
                doc.push(list);
            }
            SectionBody::Records(entries) => {
                if self.features.dated_records {
                    self.push_dated_records(doc, entries, theme);
                } else {
                    let mut list = UnorderedList::new();
                    for entry in entries {
                        list.push(Paragraph::new(plain_record_line(entry)).styled(body_style));
                    }
                    doc.push(list);
                }
            }
        }
        doc.push(Break::new(1.0));
    }

    fn push_dated_records(
        &self,
        doc: &mut genpdf::Document,
        entries: &[TimelineEntry],
        theme: &Theme,
    ) {
        let title_style = Style::new()
            .bold()
            .with_font_size(RECORD_TITLE_SIZE)
            .with_color(theme.text.into());
        let description_style = Style::new()
            .with_font_size(BODY_SIZE)
            .with_color(MUTED.into());

        for entry in entries {
            doc.push(Paragraph::new(entry.title_line()).styled(title_style));
            if !entry.description.is_empty() {
                doc.push(
                    Paragraph::new(entry.description.clone())
                        .styled(description_style)
                        .padded(Margins::trbl(mm(0.5), mm(0.0), mm(0.0), mm(6.0))),
                );
            }
            doc.push(Break::new(0.5));
        }
    }
}

/// The fallback line for entries rendered without the dated layout.
fn plain_record_line(entry: &TimelineEntry) -> String {
    if entry.description.is_empty() {
        entry.place.clone()
    } else if entry.place.is_empty() {
        entry.description.clone()
    } else {
        format!("{} - {}", entry.place, entry.description)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

enum SectionBody<'a> {
    Text(&'a str),
    List(&'a [String]),
    Records(&'a [TimelineEntry]),
}

struct Section<'a> {
    title: &'static str,
    body: SectionBody<'a>,
}

impl<'a> Section<'a> {
    fn text(title: &'static str, text: &'a str) -> Self {
        Self {
            title,
            body: SectionBody::Text(text),
        }
    }

    fn list(title: &'static str, items: &'a [String]) -> Self {
        Self {
            title,
            body: SectionBody::List(items),
        }
    }

    fn records(title: &'static str, entries: &'a [TimelineEntry]) -> Self {
        Self {
            title,
            body: SectionBody::Records(entries),
        }
    }

    fn is_empty(&self) -> bool {
        match &self.body {
            SectionBody::Text(text) => text.is_empty(),
            SectionBody::List(items) => items.is_empty(),
            SectionBody::Records(entries) => entries.is_empty(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Page decorator
// ────────────────────────────────────────────────────────────────────────────

/// First-page banner: the filled band, the name inside it, and the photo.
struct Banner {
    color: Rgb,
    height: Mm,
    name: String,
    photo: Option<genpdf::elements::Image>,
}

/// Adds margins to every page; on the first page it additionally paints the
/// full-width band before the margins apply, draws the name and photo, and
/// pushes the content start below the band. Continuation pages carry only
/// the margins.
struct CvPageDecorator {
    margins: Margins,
    margin_top: Mm,
    banner: Option<Banner>,
}

impl CvPageDecorator {
    fn new(margin: Mm, banner: Banner) -> Self {
        Self {
            margins: Margins::trbl(margin, margin, margin, margin),
            margin_top: margin,
            banner: Some(banner),
        }
    }
}

impl PageDecorator for CvPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        mut area: render::Area<'a>,
        style: Style,
    ) -> Result<render::Area<'a>, Error> {
        let Some(mut banner) = self.banner.take() else {
            area.add_margins(self.margins);
            return Ok(area);
        };

        let page_width = mm_value(area.size().width);
        let mut bar = elements::color_bar(banner.color, page_width, mm_value(banner.height))?;
        bar.render(context, area.clone(), style)?;

        area.add_margins(self.margins);

        // The margined origin sits inside the band, so the name lands on it.
        let name_style = Style::new()
            .bold()
            .with_font_size(NAME_SIZE)
            .with_color(Color::Rgb(255, 255, 255));
        let mut name = Paragraph::new(banner.name).styled(name_style);
        name.render(context, area.clone(), style)?;

        if let Some(photo) = banner.photo.as_mut() {
            photo.render(context, area.clone(), style)?;
        }

        area.add_offset(Position::new(
            0,
            banner.height - self.margin_top + mm(BAND_CONTENT_GAP_MM),
        ));
        Ok(area)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fonts;

    /// Render tests need the bundled fonts; skip with a diagnostic when they
    /// are absent (see assets/fonts/README.md).
    fn test_fonts() -> Option<FontFamily<FontData>> {
        let dir = fonts::default_font_dir();
        if !fonts::fonts_available(&dir) {
            eprintln!(
                "Skipping render test: font files missing under {}",
                dir.display()
            );
            return None;
        }
        Some(fonts::load_font_family(&dir).expect("load test fonts"))
    }

    fn sample_model() -> CvModel {
        CvModel {
            given_name: "Ada".to_string(),
            family_name: "Lovelace".to_string(),
            address: "12 Rue des Maths".to_string(),
            email: "ada@example.org".to_string(),
            phone: Some("+33 1 23 45 67 89".to_string()),
            summary: Some("Engineer with a taste for engines.".to_string()),
            experience: vec![TimelineEntry {
                start: "2020".to_string(),
                end: "2022".to_string(),
                place: "Acme".to_string(),
                description: "Built things".to_string(),
            }],
            education: vec![TimelineEntry {
                start: "2016".to_string(),
                end: "2019".to_string(),
                place: "Polytechnique".to_string(),
                description: "Studied analytical machines".to_string(),
            }],
            skills: vec!["Rust".to_string(), "Mathematics".to_string()],
            hobbies: vec!["Chess".to_string()],
            certifications: Vec::new(),
            theme: Theme::default(),
            photo: None,
            variant: TemplateVariant::Themed,
        }
    }

    fn render_to_vec(model: &CvModel) -> Option<Vec<u8>> {
        let fonts = test_fonts()?;
        let renderer = Renderer::new(fonts, model.variant);
        let mut buffer = Vec::new();
        renderer
            .render_into(model, &mut buffer)
            .expect("render CV to buffer");
        Some(buffer)
    }

    fn extracted_text(bytes: &[u8]) -> String {
        pdf_extract::extract_text_from_mem(bytes).expect("extract text from rendered PDF")
    }

    #[test]
    fn renders_a_pdf_document() {
        let Some(bytes) = render_to_vec(&sample_model()) else {
            return;
        };
        assert!(bytes.starts_with(b"%PDF"), "output carries the PDF header");
    }

    #[test]
    fn round_trips_the_experience_record() {
        let Some(bytes) = render_to_vec(&sample_model()) else {
            return;
        };
        let text = extracted_text(&bytes);
        let title = text.find("2020 - 2022 : Acme").expect("record title");
        let description = text.find("Built things").expect("record description");
        assert!(title < description, "description follows its title");
    }

    #[test]
    fn omits_headings_of_empty_sections() {
        let mut model = sample_model();
        model.skills.clear();
        model.hobbies.clear();
        let Some(bytes) = render_to_vec(&model) else {
            return;
        };
        let text = extracted_text(&bytes);
        assert!(!text.contains("Skills"));
        assert!(!text.contains("Certifications"));
        assert!(!text.contains("Hobbies"));
        assert!(text.contains("Professional Experience"));
    }

    #[test]
    fn renders_experience_records_in_input_order() {
        let mut model = sample_model();
        model.experience = (1..=4)
            .map(|i| TimelineEntry {
                start: format!("201{i}"),
                end: format!("201{}", i + 1),
                place: format!("Employer {i}"),
                description: format!("Experience record number {i}"),
            })
            .collect();
        let Some(bytes) = render_to_vec(&model) else {
            return;
        };
        let text = extracted_text(&bytes);
        let positions: Vec<usize> = (1..=4)
            .map(|i| {
                text.find(&format!("Experience record number {i}"))
                    .expect("record present")
            })
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "order preserved");
    }

    #[test]
    fn paginates_long_experience_lists() {
        let mut model = sample_model();
        model.experience = (0..60)
            .map(|i| TimelineEntry {
                start: "2020".to_string(),
                end: "2021".to_string(),
                place: format!("Employer {i}"),
                description: format!("Long running engagement number {i}"),
            })
            .collect();
        let Some(bytes) = render_to_vec(&model) else {
            return;
        };
        let text = extracted_text(&bytes);
        assert!(text.contains("Long running engagement number 0"));
        assert!(text.contains("Long running engagement number 59"));
    }

    #[test]
    fn renders_with_a_photo_inset() {
        let mut model = sample_model();
        model.photo = Some(image::DynamicImage::ImageRgb8(
            image::RgbImage::from_pixel(120, 90, image::Rgb([200, 180, 160])),
        ));
        let Some(bytes) = render_to_vec(&model) else {
            return;
        };
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn basic_variant_renders_plain_bullets_without_extended_sections() {
        let mut model = sample_model();
        model.variant = TemplateVariant::Basic;
        let Some(fonts) = test_fonts() else { return };
        let renderer = Renderer::new(fonts, model.variant);
        let mut buffer = Vec::new();
        renderer.render_into(&model, &mut buffer).expect("render");
        let text = extracted_text(&buffer);
        assert!(!text.contains("Profile"), "summary section is themed-only");
        assert!(!text.contains("2020 - 2022"), "no dated record lines");
        assert!(text.contains("Built things"));
    }

    #[test]
    fn theme_override_only_applies_to_themed_variant() {
        let Some(fonts) = test_fonts() else { return };
        let mut model = sample_model();
        model.theme = Theme::resolve(Some("#222222"), None);

        let themed = Renderer::new(fonts.clone(), TemplateVariant::Themed);
        assert_eq!(
            themed.effective_theme(&model).header,
            Rgb {
                r: 0x22,
                g: 0x22,
                b: 0x22
            }
        );

        let dated = Renderer::new(fonts, TemplateVariant::Dated);
        assert_eq!(dated.effective_theme(&model), Theme::default());
    }
}

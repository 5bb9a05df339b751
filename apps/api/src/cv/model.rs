//! The normalized CV model and its construction from a decoded form.

use serde::Serialize;
use tracing::warn;

use crate::cv::form::CvForm;
use crate::errors::AppError;
use crate::render::theme::Theme;

// Field aliases, grouped the way the HTML form names them.
const GIVEN_NAME: &[&str] = &["prenom", "givenName"];
const FAMILY_NAME: &[&str] = &["nom", "familyName"];
const ADDRESS: &[&str] = &["adresse", "address"];
const EMAIL: &[&str] = &["email"];
const PHONE: &[&str] = &["telephone", "phone"];
const SUMMARY: &[&str] = &["profil", "summary"];
const SKILLS: &[&str] = &["competence", "skills"];
const HOBBIES: &[&str] = &["loisir", "hobbies"];
const CERTIFICATIONS: &[&str] = &["certification", "certifications"];

// ────────────────────────────────────────────────────────────────────────────
// Template variants
// ────────────────────────────────────────────────────────────────────────────

/// Variant tag selecting the feature set of the renderer. Each tag is a
/// superset of the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateVariant {
    /// Plain bulleted entries, fixed colors.
    Basic,
    /// Dated record layout for experience and education.
    Dated,
    /// Dated layout plus caller-supplied theme colors.
    #[default]
    Themed,
}

impl TemplateVariant {
    fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        match value.to_ascii_lowercase().as_str() {
            "basic" => TemplateVariant::Basic,
            "dated" => TemplateVariant::Dated,
            "themed" => TemplateVariant::Themed,
            other => {
                warn!("Unknown template variant '{other}', using the default");
                Self::default()
            }
        }
    }

    /// Feature toggles the renderer consults.
    pub fn features(self) -> TemplateFeatures {
        match self {
            TemplateVariant::Basic => TemplateFeatures {
                dated_records: false,
                theme_overrides: false,
                extended_sections: false,
            },
            TemplateVariant::Dated => TemplateFeatures {
                dated_records: true,
                theme_overrides: false,
                extended_sections: true,
            },
            TemplateVariant::Themed => TemplateFeatures {
                dated_records: true,
                theme_overrides: true,
                extended_sections: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TemplateFeatures {
    /// `"{start} - {end} : {place}"` record lines instead of plain bullets.
    pub dated_records: bool,
    /// Honor the `headerColor` / `textColor` form fields.
    pub theme_overrides: bool,
    /// Render the summary and certifications sections.
    pub extended_sections: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Model
// ────────────────────────────────────────────────────────────────────────────

/// One dated entry of a record-type section (experience or education).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TimelineEntry {
    pub start: String,
    pub end: String,
    pub place: String,
    pub description: String,
}

impl TimelineEntry {
    pub fn is_empty(&self) -> bool {
        self.start.is_empty()
            && self.end.is_empty()
            && self.place.is_empty()
            && self.description.is_empty()
    }

    /// The bold title line of a dated record.
    pub fn title_line(&self) -> String {
        if self.start.is_empty() && self.end.is_empty() {
            self.place.clone()
        } else {
            format!("{} - {} : {}", self.start, self.end, self.place)
        }
    }
}

/// A fully decoded, validated CV. Immutable for the duration of a render;
/// nothing survives the request.
#[derive(Clone, Debug, Serialize)]
pub struct CvModel {
    pub given_name: String,
    pub family_name: String,
    pub address: String,
    pub email: String,
    pub phone: Option<String>,
    pub summary: Option<String>,
    pub experience: Vec<TimelineEntry>,
    pub education: Vec<TimelineEntry>,
    pub skills: Vec<String>,
    pub hobbies: Vec<String>,
    pub certifications: Vec<String>,
    pub theme: Theme,
    #[serde(skip)]
    pub photo: Option<image::DynamicImage>,
    pub variant: TemplateVariant,
}

impl CvModel {
    /// Builds the model from a decoded form.
    ///
    /// Required fields are checked before anything else so that a rejection
    /// happens before the response stream opens. A missing photo is only an
    /// error when `require_photo` is set; a photo that is present but
    /// undecodable is dropped with a warning and the request still succeeds.
    pub fn from_form(mut form: CvForm, require_photo: bool) -> Result<Self, AppError> {
        let mut missing = Vec::new();
        let given_name = required(&form, GIVEN_NAME, "prenom", &mut missing);
        let family_name = required(&form, FAMILY_NAME, "nom", &mut missing);
        let address = required(&form, ADDRESS, "adresse", &mut missing);
        let email = required(&form, EMAIL, "email", &mut missing);
        if require_photo && form.photo().is_none() {
            missing.push("photo");
        }
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let variant = TemplateVariant::parse(form.first(&["template"]));
        let theme = Theme::resolve(form.first(&["headerColor"]), form.first(&["textColor"]));

        let photo = form
            .take_photo()
            .and_then(|upload| match image::load_from_memory(&upload.bytes) {
                Ok(decoded) => Some(decoded),
                Err(err) => {
                    warn!("Skipping unreadable photo '{}': {err}", upload.file_name);
                    None
                }
            });

        Ok(CvModel {
            given_name,
            family_name,
            address,
            email,
            phone: form.first(PHONE).map(str::to_string),
            summary: form.first(SUMMARY).map(str::to_string),
            experience: zip_timeline(&form, "experience"),
            education: zip_timeline(&form, "formation"),
            skills: list_values(&form, SKILLS),
            hobbies: list_values(&form, HOBBIES),
            certifications: list_values(&form, CERTIFICATIONS),
            theme,
            photo,
            variant,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

fn required(
    form: &CvForm,
    aliases: &[&str],
    canonical: &'static str,
    missing: &mut Vec<&'static str>,
) -> String {
    match form.first(aliases) {
        Some(value) => value.to_string(),
        None => {
            missing.push(canonical);
            String::new()
        }
    }
}

/// Zips the parallel `{prefix}StartDate/EndDate/Lieu/Description` arrays into
/// records. Columns that disagree in length are truncated to the shortest
/// present column with a warning; absent columns contribute empty strings;
/// rows with no content at all are dropped.
fn zip_timeline(form: &CvForm, prefix: &str) -> Vec<TimelineEntry> {
    let start_name = format!("{prefix}StartDate");
    let end_name = format!("{prefix}EndDate");
    let place_name = format!("{prefix}Lieu");
    let place_alias = format!("{prefix}Place");
    let description_name = format!("{prefix}Description");

    let starts = form.values(&[start_name.as_str()]);
    let ends = form.values(&[end_name.as_str()]);
    let places = form.values(&[place_name.as_str(), place_alias.as_str()]);
    let descriptions = form.values(&[description_name.as_str()]);

    let lengths = [starts.len(), ends.len(), places.len(), descriptions.len()];
    let longest = lengths.into_iter().max().unwrap_or(0);
    let count = lengths
        .into_iter()
        .filter(|len| *len > 0)
        .min()
        .unwrap_or(0);
    if count < longest {
        warn!("Mismatched {prefix} arrays (lengths {lengths:?}), truncating to {count}");
    }

    (0..count)
        .map(|i| TimelineEntry {
            start: cell(starts, i),
            end: cell(ends, i),
            place: cell(places, i),
            description: cell(descriptions, i),
        })
        .filter(|entry| !entry.is_empty())
        .collect()
}

fn cell(values: &[String], index: usize) -> String {
    values
        .get(index)
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

fn list_values(form: &CvForm, aliases: &[&str]) -> Vec<String> {
    form.values(aliases)
        .iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

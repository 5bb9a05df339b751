//! Multipart form decoding for the CV generator.
//!
//! The public form posts French field names (`nom`, `prenom`, `adresse`);
//! newer clients use English aliases for some of them. Repeated inputs may
//! arrive either as bare repeated names or with a `[]` suffix, so names are
//! normalized before grouping.

use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::AppError;

/// Raw text fields grouped by normalized name, plus the optional photo upload.
#[derive(Debug, Default)]
pub struct CvForm {
    fields: HashMap<String, Vec<String>>,
    photo: Option<UploadedPhoto>,
}

/// An uploaded photo as received, before image decoding.
#[derive(Debug, Clone)]
pub struct UploadedPhoto {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Drains the multipart stream into a `CvForm`.
///
/// Unknown text fields are kept (the model layer decides what it needs);
/// only the `photo` field is treated as binary. An empty photo part (file
/// input left blank) counts as no photo.
pub async fn collect(mut multipart: Multipart) -> Result<CvForm, AppError> {
    let mut form = CvForm::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name() else { continue };
        let name = normalize_field_name(name);

        if name == "photo" {
            let file_name = field.file_name().unwrap_or("photo").to_string();
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                form.photo = Some(UploadedPhoto { file_name, bytes });
            }
        } else {
            let value = field.text().await?;
            form.fields.entry(name).or_default().push(value);
        }
    }

    Ok(form)
}

impl CvForm {
    /// First non-empty value among the given field-name aliases.
    pub fn first(&self, aliases: &[&str]) -> Option<&str> {
        aliases.iter().find_map(|name| {
            self.fields
                .get(*name)?
                .iter()
                .map(|value| value.trim())
                .find(|value| !value.is_empty())
        })
    }

    /// All values posted under the first alias that is present at all.
    pub fn values(&self, aliases: &[&str]) -> &[String] {
        aliases
            .iter()
            .find_map(|name| self.fields.get(*name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn photo(&self) -> Option<&UploadedPhoto> {
        self.photo.as_ref()
    }

    pub fn take_photo(&mut self) -> Option<UploadedPhoto> {
        self.photo.take()
    }
}

/// Strips the `[]` suffix HTML forms append to repeated inputs.
fn normalize_field_name(name: &str) -> String {
    name.strip_suffix("[]").unwrap_or(name).to_string()
}

#[cfg(test)]
impl CvForm {
    /// Builds a form directly from name/value pairs, bypassing multipart.
    pub fn from_fields(fields: &[(&str, &[&str])]) -> Self {
        let mut form = CvForm::default();
        for (name, values) in fields {
            for value in *values {
                form.fields
                    .entry(normalize_field_name(name))
                    .or_default()
                    .push((*value).to_string());
            }
        }
        form
    }

    pub fn set_photo_bytes(&mut self, file_name: &str, bytes: &[u8]) {
        self.photo = Some(UploadedPhoto {
            file_name: file_name.to_string(),
            bytes: Bytes::copy_from_slice(bytes),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_array_suffix_from_field_names() {
        assert_eq!(normalize_field_name("competence[]"), "competence");
        assert_eq!(normalize_field_name("competence"), "competence");
    }

    #[test]
    fn first_skips_blank_values_and_honors_aliases() {
        let form = CvForm::from_fields(&[("profil", &["  "]), ("summary", &["Ten years of Rust"])]);
        assert_eq!(form.first(&["profil", "summary"]), Some("Ten years of Rust"));
        assert_eq!(form.first(&["telephone"]), None);
    }

    #[test]
    fn values_returns_the_first_present_alias() {
        let form = CvForm::from_fields(&[("skills[]", &["Rust", "SQL"])]);
        assert_eq!(form.values(&["competence", "skills"]), ["Rust", "SQL"]);
        assert!(form.values(&["loisir", "hobbies"]).is_empty());
    }
}

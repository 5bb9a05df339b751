use anyhow::Context as _;
use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::cv::form;
use crate::cv::model::CvModel;
use crate::errors::AppError;
use crate::render::{stream, Renderer};
use crate::state::AppState;

/// POST /generate-cv
///
/// Decodes the multipart form into a `CvModel`, validates required fields,
/// then streams the rendered PDF back. Headers (including the attachment
/// filename) are sent before the first body byte; the render itself runs on
/// the blocking pool and writes through a channel into the response body.
pub async fn handle_generate_cv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let fields = form::collect(multipart).await?;
    let model = CvModel::from_form(fields, state.config.require_photo)?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        attachment_filename(&model)
    ))
    .context("building Content-Disposition header")?;

    info!(
        variant = ?model.variant,
        experience = model.experience.len(),
        education = model.education.len(),
        "rendering CV for {} {}",
        model.given_name,
        model.family_name
    );

    let renderer = Renderer::new(state.fonts.clone(), model.variant);
    let (mut writer, body_stream) = stream::channel();

    // The genpdf pipeline is CPU-bound and writes through a blocking channel,
    // so it must stay off the async worker threads. A failure here happens
    // after the 200 header has gone out: all we can do is error the body
    // stream so the connection is torn down instead of ending cleanly.
    tokio::task::spawn_blocking(move || {
        if let Err(err) = renderer.render_into(&model, &mut writer) {
            error!("CV render failed mid-stream: {err}");
            writer.fail(err.to_string());
        }
    });

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/pdf"),
        ),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    Ok((headers, Body::from_stream(body_stream)).into_response())
}

/// `cv-<prenom>-<nom>.pdf`, restricted to characters that are safe inside a
/// quoted Content-Disposition filename.
fn attachment_filename(model: &CvModel) -> String {
    format!(
        "cv-{}-{}.pdf",
        sanitize_filename_part(&model.given_name),
        sanitize_filename_part(&model.family_name)
    )
}

fn sanitize_filename_part(part: &str) -> String {
    let mut cleaned = String::with_capacity(part.len());
    for c in part.trim().chars() {
        if c.is_ascii_alphanumeric() {
            cleaned.push(c);
        } else if !cleaned.ends_with('-') && !cleaned.is_empty() {
            cleaned.push('-');
        }
    }
    let cleaned = cleaned.trim_end_matches('-');
    if cleaned.is_empty() {
        "cv".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::render::fonts;
    use crate::routes::build_router;
    use crate::state::AppState;

    const BOUNDARY: &str = "cvform-test-boundary";

    fn test_config() -> Config {
        Config {
            port: 0,
            rust_log: "info".to_string(),
            font_dir: fonts::default_font_dir(),
            require_photo: false,
            max_upload_mb: 10,
        }
    }

    /// Router tests need real fonts on disk; skip with a diagnostic when the
    /// bundled family is absent (see assets/fonts/README.md).
    fn test_state() -> Option<AppState> {
        let dir = fonts::default_font_dir();
        if !fonts::fonts_available(&dir) {
            eprintln!(
                "Skipping router test: font files missing under {}",
                dir.display()
            );
            return None;
        }
        let fonts = fonts::load_font_family(&dir).expect("load test fonts");
        Some(AppState {
            config: test_config(),
            fonts,
        })
    }

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn file_part(name: &str, file_name: &str, contents: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n{contents}\r\n"
        )
    }

    fn generate_request(parts: Vec<String>) -> Request<Body> {
        let mut body = parts.concat();
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Request::builder()
            .method("POST")
            .uri("/generate-cv")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn valid_parts() -> Vec<String> {
        vec![
            text_part("nom", "Lovelace"),
            text_part("prenom", "Ada"),
            text_part("adresse", "12 Rue des Maths"),
            text_part("email", "ada@example.org"),
            text_part("experienceStartDate[]", "2020"),
            text_part("experienceEndDate[]", "2022"),
            text_part("experienceLieu[]", "Acme"),
            text_part("experienceDescription[]", "Built things"),
            text_part("competence[]", "Rust"),
        ]
    }

    #[tokio::test]
    async fn missing_required_fields_return_400_and_no_pdf_bytes() {
        let Some(state) = test_state() else { return };
        let app = build_router(state);

        let request = generate_request(vec![text_part("nom", "Lovelace")]);
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("prenom"), "names the missing field: {body}");
        assert!(body.contains("email"), "names the missing field: {body}");
        assert!(!body.contains("%PDF"), "no PDF bytes on validation failure");
    }

    #[tokio::test]
    async fn generates_pdf_attachment_for_valid_form() {
        let Some(state) = test_state() else { return };
        let app = build_router(state);

        let response = app.oneshot(generate_request(valid_parts())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"cv-Ada-Lovelace.pdf\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"), "body is a PDF document");
    }

    #[tokio::test]
    async fn corrupt_photo_still_yields_complete_pdf() {
        let Some(state) = test_state() else { return };
        let app = build_router(state);

        let mut parts = valid_parts();
        parts.push(file_part("photo", "me.jpg", "definitely-not-a-jpeg"));
        let response = app.oneshot(generate_request(parts)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn filename_parts_are_sanitized() {
        assert_eq!(sanitize_filename_part("Ada"), "Ada");
        assert_eq!(sanitize_filename_part("de la Cruz"), "de-la-Cruz");
        assert_eq!(sanitize_filename_part("  O'Brien "), "O-Brien");
        assert_eq!(sanitize_filename_part("\"\r\n"), "cv");
    }
}

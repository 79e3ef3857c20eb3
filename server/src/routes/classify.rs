//! Classify page

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Html,
};
use tracing::{error, warn};

use brain_classifier::app::{classify, ClassifyForm, ClassifyOutcome, Page, Upload};
use brain_classifier::TestType;

use super::{page_error, status_for, PageError, PageResult};
use crate::state::SharedState;
use crate::views;

const INCOMPLETE_NOTICE: &str =
    "Please enter the patient name and age, select a test type and upload a jpg, jpeg or png scan.";

/// GET /classify - Empty classify form
pub async fn classify_page() -> Html<String> {
    Html(views::classify_form(&ClassifyForm::default(), None))
}

/// POST /classify - Run the selected model on the uploaded scan
pub async fn submit(State(state): State<SharedState>, multipart: Multipart) -> PageResult {
    let form = read_form(multipart).await?;
    let file_name = form
        .upload
        .as_ref()
        .map(|u| u.file_name.clone())
        .unwrap_or_default();

    let worker_state = state.clone();
    let worker_form = form.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        classify(&worker_form, &worker_state.registry, &worker_state.config.inference)
    })
    .await
    .map_err(|e| {
        error!("Classification task failed: {}", e);
        page_error(StatusCode::INTERNAL_SERVER_ERROR, Page::Classify, "Classification task failed")
    })?;

    match outcome {
        Ok(ClassifyOutcome::Incomplete) => Ok(Html(views::classify_form(&form, Some(INCOMPLETE_NOTICE)))),
        Ok(ClassifyOutcome::Completed { prediction, report }) => {
            Ok(Html(views::classify_result(&file_name, &prediction, &report)))
        }
        Err(e) => {
            warn!("Classification of {:?} failed: {}", file_name, e);
            Err(page_error(status_for(&e), Page::Classify, e.to_string()))
        }
    }
}

/// Collect the multipart fields into a form; unknown fields are ignored
async fn read_form(mut multipart: Multipart) -> Result<ClassifyForm, PageError> {
    let mut form = ClassifyForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| page_error(e.status(), Page::Classify, e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "patient_name" | "patient_age" | "test_type" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| page_error(e.status(), Page::Classify, e.body_text()))?;
                match name.as_str() {
                    "patient_name" => form.patient_name = value,
                    "patient_age" => form.patient_age = value,
                    _ => form.test_type = parse_test_type(&value)?,
                }
            }
            "scan" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| page_error(e.status(), Page::Classify, e.body_text()))?;
                if !file_name.is_empty() || !bytes.is_empty() {
                    form.upload = Some(Upload::new(file_name, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

fn parse_test_type(value: &str) -> Result<Option<TestType>, PageError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|e: brain_classifier::BrainError| page_error(StatusCode::BAD_REQUEST, Page::Classify, e.to_string()))
}

//! Report download

use axum::{
    extract::Form,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use brain_classifier::app::Page;
use brain_classifier::inference::REPORT_MIME_TYPE;
use brain_classifier::{ConditionLabel, Report, TestType, REPORT_FILE_NAME};

use super::{page_error, PageError};

#[derive(Debug, Deserialize)]
pub struct ReportForm {
    pub patient_name: String,
    pub patient_age: String,
    pub test_type: String,
    pub prediction: String,
}

/// POST /report - Return the rendered report as a file attachment
pub async fn download_report(Form(form): Form<ReportForm>) -> Result<Response, PageError> {
    let bad_request = |e: brain_classifier::BrainError| page_error(StatusCode::BAD_REQUEST, Page::Classify, e.to_string());

    let test_type: TestType = form.test_type.parse().map_err(bad_request)?;
    let prediction: ConditionLabel = form.prediction.parse().map_err(bad_request)?;

    // Same rule as the classify form: trimmed name and age must be present
    let patient_name = form.patient_name.trim();
    let patient_age = form.patient_age.trim();
    if patient_name.is_empty() || patient_age.is_empty() {
        return Err(page_error(
            StatusCode::BAD_REQUEST,
            Page::Classify,
            "Patient name and age are required for a report",
        ));
    }

    let report = Report::new(patient_name, patient_age, test_type, prediction);
    let disposition = format!("attachment; filename=\"{}\"", REPORT_FILE_NAME);

    Ok((
        [
            (header::CONTENT_TYPE, REPORT_MIME_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.render(),
    )
        .into_response())
}

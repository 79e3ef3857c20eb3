//! Route handlers

pub mod classify;
pub mod health;
pub mod pages;
pub mod report;

use axum::http::StatusCode;
use axum::response::Html;

use brain_classifier::app::Page;
use brain_classifier::BrainError;

use crate::views;

/// Error response rendered as an HTML page
pub type PageError = (StatusCode, Html<String>);

pub type PageResult = Result<Html<String>, PageError>;

pub(crate) fn page_error(status: StatusCode, current: Page, message: impl AsRef<str>) -> PageError {
    let title = status.canonical_reason().unwrap_or("Error");
    (status, Html(views::error(current, title, message.as_ref())))
}

/// HTTP status shown for a failed classification
pub(crate) fn status_for(err: &BrainError) -> StatusCode {
    match err {
        BrainError::ModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        BrainError::ImageLoad(_, _) => StatusCode::UNPROCESSABLE_ENTITY,
        BrainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

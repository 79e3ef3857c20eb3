//! Navigable pages

use axum::{extract::Query, http::StatusCode, response::Html};
use serde::Deserialize;

use brain_classifier::app::{AppState, NavAction, Page};

use super::{page_error, PageResult};
use crate::views;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Page the request was made from
    pub page: Option<String>,
    /// Navigation button that was clicked
    pub nav: Option<String>,
}

/// GET / - Render the current page after applying the navigation action
pub async fn index(Query(query): Query<PageQuery>) -> PageResult {
    let mut state = match query.page.as_deref().filter(|p| !p.is_empty()) {
        Some(page) => AppState::on(page.parse::<Page>().map_err(|e| page_error(StatusCode::BAD_REQUEST, Page::Home, e.to_string()))?),
        None => AppState::default(),
    };

    if let Some(nav) = query.nav.as_deref().filter(|n| !n.is_empty()) {
        let action: NavAction = nav
            .parse()
            .map_err(|e: brain_classifier::BrainError| page_error(StatusCode::BAD_REQUEST, state.page, e.to_string()))?;
        state = state.navigate(action);
    }

    Ok(Html(views::page(state.page)))
}

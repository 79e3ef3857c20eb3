//! Page navigation as an explicit state value.
//!
//! Every request carries the current page; `AppState::navigate` returns the
//! next one. Nothing is shared between sessions and nothing resets the page
//! behind the caller's back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::error::BrainError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Home,
    Classify,
    About,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Home, Page::Classify, Page::About];

    /// Navigation button text
    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Classify => "Classify",
            Page::About => "About Brain Diseases",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Classify => "classify",
            Page::About => "about",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Page {
    type Err = BrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Page::ALL
            .into_iter()
            .find(|p| p.slug().eq_ignore_ascii_case(needle) || p.title().eq_ignore_ascii_case(needle))
            .ok_or_else(|| BrainError::InvalidInput(format!("Unknown page: '{}'", s)))
    }
}

/// A click on one of the navigation buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavAction {
    Home,
    Classify,
    About,
}

impl NavAction {
    pub fn target(&self) -> Page {
        match self {
            NavAction::Home => Page::Home,
            NavAction::Classify => Page::Classify,
            NavAction::About => Page::About,
        }
    }
}

impl FromStr for NavAction {
    type Err = BrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<Page>()? {
            Page::Home => NavAction::Home,
            Page::Classify => NavAction::Classify,
            Page::About => NavAction::About,
        })
    }
}

/// Per-session UI state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    pub page: Page,
}

impl AppState {
    pub fn on(page: Page) -> Self {
        Self { page }
    }

    /// Apply a navigation action and return the resulting state
    pub fn navigate(self, action: NavAction) -> AppState {
        AppState { page: action.target() }
    }
}

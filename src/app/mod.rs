//! Application layer shared by the web server and the CLI
//!
//! - `page`: Home / Classify / About navigation as a state value
//! - `classify`: form validation and the inference-to-report flow

pub mod classify;
pub mod page;

pub use classify::{classify, ClassifyForm, ClassifyOutcome, ClassifyRequest, Upload, ACCEPTED_EXTENSIONS};
pub use page::{AppState, NavAction, Page};

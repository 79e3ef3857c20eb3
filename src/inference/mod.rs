//! Inference module for scan classification
//!
//! This module provides:
//! - Scan decoding and the score-to-label decision rule
//! - The per-test-type model registry, loaded once at start-up
//! - The plain-text medical report
//! - Accuracy of a model over an organized split

pub mod evaluate;
pub mod predictor;
pub mod registry;
pub mod report;

// Re-export main types for convenience
pub use evaluate::{evaluate_split, ClassAccuracy, EvalConfig, EvalReport};
pub use predictor::{load_scan, BurnScanModel, Decision, ImageTensor, Prediction, Predictor, ScanModel};
pub use registry::{ModelRegistry, SlotStatus};
pub use report::{Report, REPORT_FILE_NAME, REPORT_MIME_TYPE};

//! Error Handling Module
//!
//! Defines the error type shared by the dataset, model and inference layers.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

use crate::TestType;

/// Main error type for brain classifier operations
#[derive(Error, Debug)]
pub enum BrainError {
    /// Error loading or decoding an image
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Error with dataset operations
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// A dataset directory has no train/test split yet
    #[error("Splits not detected in '{0}' (expected train/ and test/)")]
    SplitsNotDetected(PathBuf),

    /// Error building or loading a model
    #[error("Model error: {0}")]
    Model(String),

    /// The registry slot for a test type holds a load failure
    #[error("Model for '{test_type}' is unavailable: {reason}")]
    ModelUnavailable { test_type: TestType, reason: String },

    /// Error while running a forward pass
    #[error("Inference error: {0}")]
    Inference(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience Result type for brain classifier operations
pub type Result<T> = std::result::Result<T, BrainError>;

/// Attach a message to a failed filesystem step, producing a `Dataset` error
pub trait ResultExt<T> {
    fn context(self, msg: &str) -> Result<T>;

    /// Like `context`, with the message built only on failure
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| BrainError::Dataset(format!("{}: {}", f(), e)))
    }
}

impl<T> ResultExt<T> for Option<T> {
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.ok_or_else(|| BrainError::Dataset(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_not_detected_names_directory() {
        let err = BrainError::SplitsNotDetected(PathBuf::from("data/tumor"));
        assert_eq!(
            err.to_string(),
            "Splits not detected in 'data/tumor' (expected train/ and test/)"
        );
    }

    #[test]
    fn test_model_unavailable_names_test_type() {
        let err = BrainError::ModelUnavailable {
            test_type: TestType::Tumor,
            reason: "missing file".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Tumor"));
        assert!(msg.contains("missing file"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: BrainError = io.into();
        assert!(matches!(err, BrainError::Io(_)));
    }

    #[test]
    fn test_context_prefixes_message() {
        let failed: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        match failed.context("Failed to copy scan.jpg") {
            Err(BrainError::Dataset(msg)) => assert_eq!(msg, "Failed to copy scan.jpg: gone"),
            other => panic!("unexpected result: {:?}", other),
        }

        let missing: Option<&str> = None;
        assert!(matches!(
            missing.with_context(|| "no file name".to_string()),
            Err(BrainError::Dataset(_))
        ));
    }

    /// Fails to build if a variant is added or removed without updating callers
    fn variant_name(err: &BrainError) -> &'static str {
        match err {
            BrainError::ImageLoad(..) => "image",
            BrainError::Dataset(_) => "dataset",
            BrainError::SplitsNotDetected(_) => "splits",
            BrainError::Model(_) => "model",
            BrainError::ModelUnavailable { .. } => "unavailable",
            BrainError::Inference(_) => "inference",
            BrainError::Config(_) => "config",
            BrainError::Io(_) => "io",
            BrainError::InvalidInput(_) => "input",
        }
    }

    #[test]
    fn test_every_variant_displays_its_detail() {
        let cases = [
            BrainError::ImageLoad(PathBuf::from("scan.png"), "bad header".into()),
            BrainError::Dataset("bad header".into()),
            BrainError::Model("bad header".into()),
            BrainError::Inference("bad header".into()),
            BrainError::Config("bad header".into()),
            BrainError::InvalidInput("bad header".into()),
        ];
        for err in &cases {
            assert!(err.to_string().contains("bad header"), "{} lost its detail", variant_name(err));
        }
    }
}

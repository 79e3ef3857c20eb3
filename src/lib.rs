//! # Brain Classifier
//!
//! A Rust library for brain MRI disease classification using the Burn framework.
//! Covers three conditions, each served by its own pre-trained binary model.
//!
//! ## Modules
//!
//! - `dataset`: Directory organizing, image loading, preprocessing and augmentation
//! - `model`: CNN and LSTM architectures built with Burn
//! - `inference`: Scan decoding, the per-test-type model registry and the text report
//! - `app`: Page navigation and the classify flow shared by the web server and CLI
//! - `utils`: Logging, configuration and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brain_classifier::dataset::{organize_base_dir, SplitRatios};
//!
//! // Turn <base>/<dataset>/<class>/* into train/test/valid folders
//! let report = organize_base_dir("data", &SplitRatios::default())?;
//! println!("{}", report);
//! ```

pub mod app;
pub mod backend;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod types;
pub mod utils;

// Re-export commonly used items for convenience
pub use app::{classify, AppState, ClassifyForm, ClassifyOutcome, NavAction, Page};
pub use dataset::loader::{DirectoryDataset, LoaderConfig};
pub use dataset::organize::{organize_base_dir, OrganizeReport};
pub use dataset::pipeline::{Pipeline, PipelineMode, ProcessedDataset};
pub use dataset::split::{three_way_split, train_test_split, SplitRatios};
pub use inference::predictor::{Decision, Prediction, Predictor, ScanModel};
pub use inference::registry::{ModelRegistry, SlotStatus};
pub use inference::report::{Report, REPORT_FILE_NAME};
pub use types::{ConditionLabel, TestType};
pub use utils::config::AppConfig;
pub use utils::error::{BrainError, Result};

/// Image size the preprocessing pipeline resizes training data to
pub const TRAINING_IMAGE_SIZE: usize = 224;

/// Image size uploaded scans are resized to before inference
pub const INFERENCE_IMAGE_SIZE: usize = 124;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

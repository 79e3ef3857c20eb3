//! Dataset module for brain MRI scans
//!
//! This module provides:
//! - Deterministic train/test/valid splitting and on-disk organizing
//! - Directory loading with class labels taken from folder names
//! - The preprocessing pipeline (resize, rescale, augmentation, cache, prefetch)
//! - Burn `Dataset`/`Batcher` integration
//! - A side-by-side preview of the processed splits

pub mod augmentation;
pub mod burn_dataset;
pub mod loader;
pub mod organize;
pub mod pipeline;
pub mod preview;
pub mod split;

pub use augmentation::{AugmentationConfig, Augmenter};
pub use burn_dataset::{ScanBatch, ScanBatcher, ScanDataset, ScanItem};
pub use loader::{load_splits, DatasetSplits, DatasetStats, DirectoryDataset, ImageSample, LoaderConfig};
pub use organize::{organize_base_dir, organize_dataset, OrganizeReport, SPLIT_DIRS};
pub use pipeline::{Pipeline, PipelineMode, ProcessedBatch, ProcessedDataset};
pub use preview::{render_preview, save_preview};
pub use split::{three_way_split, train_test_split, SplitRatios, ThreeWaySplit};

//! Directory Dataset Loader
//!
//! Loads a split folder (`train/`, `test/` or `valid/`) as a labelled image
//! dataset: one subfolder per class, class indices assigned in sorted name
//! order.

use std::fmt;
use std::path::{Path, PathBuf};

use image::{imageops::FilterType, ImageReader, RgbImage};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::pipeline::{Pipeline, PipelineMode, ProcessedDataset};
use crate::utils::error::{BrainError, Result};

/// File extensions treated as images
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

/// A single image sample with its label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Class label index
    pub label: usize,
    /// Class name (the parent folder)
    pub class_name: String,
}

/// How a directory is read into samples and batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Target size as (height, width)
    pub image_size: (usize, usize),
    pub batch_size: usize,
    pub shuffle: bool,
    pub seed: u64,
    /// Batches buffered ahead of the consumer
    pub prefetch: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            image_size: (crate::TRAINING_IMAGE_SIZE, crate::TRAINING_IMAGE_SIZE),
            batch_size: 32,
            shuffle: true,
            seed: 21,
            prefetch: 2,
        }
    }
}

pub(crate) fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Labelled images found under one directory
#[derive(Debug, Clone)]
pub struct DirectoryDataset {
    /// Root directory of the split
    pub root_dir: PathBuf,
    /// All samples, shuffled when the config asks for it
    pub samples: Vec<ImageSample>,
    /// Class names; the index is the label
    pub class_names: Vec<String>,
    pub config: LoaderConfig,
}

impl DirectoryDataset {
    /// Read the class folders under `root_dir`
    ///
    /// ```text
    /// root_dir/
    /// ├── no/
    /// │   ├── scan1.jpg
    /// │   └── scan2.jpg
    /// └── yes/
    ///     └── ...
    /// ```
    pub fn open<P: AsRef<Path>>(root_dir: P, config: &LoaderConfig) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        debug!("Loading image directory: {:?}", root_dir);

        if !root_dir.is_dir() {
            return Err(BrainError::Dataset(format!(
                "Dataset directory does not exist: {:?}",
                root_dir
            )));
        }

        let mut class_names: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                class_names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        class_names.sort();

        let mut samples = Vec::new();
        for (label, class_name) in class_names.iter().enumerate() {
            let mut class_files: Vec<PathBuf> = WalkDir::new(root_dir.join(class_name))
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|e| e.ok())
                .map(|e| e.into_path())
                .filter(|p| p.is_file() && is_image_file(p))
                .collect();
            class_files.sort();

            debug!("Class '{}' (label {}): {} images", class_name, label, class_files.len());
            samples.extend(class_files.into_iter().map(|path| ImageSample {
                path,
                label,
                class_name: class_name.clone(),
            }));
        }

        if config.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
            samples.shuffle(&mut rng);
        }

        info!(
            "Found {} files belonging to {} classes in {:?}",
            samples.len(),
            class_names.len(),
            root_dir
        );

        Ok(Self {
            root_dir,
            samples,
            class_names,
            config: config.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Number of batches one pass yields (the last may be partial)
    pub fn num_batches(&self) -> usize {
        self.len().div_ceil(self.config.batch_size.max(1))
    }

    /// Decode a sample and resize it to the configured size
    pub fn load_image(&self, sample: &ImageSample) -> Result<RgbImage> {
        let (height, width) = self.config.image_size;
        load_image(&sample.path, height as u32, width as u32)
    }

    pub fn stats(&self) -> DatasetStats {
        let mut class_counts: Vec<(String, usize)> =
            self.class_names.iter().map(|name| (name.clone(), 0)).collect();
        for sample in &self.samples {
            class_counts[sample.label].1 += 1;
        }

        DatasetStats {
            total_samples: self.samples.len(),
            class_counts,
        }
    }
}

/// Decode an image file to RGB and resize it exactly to `height x width`
pub fn load_image(path: &Path, height: u32, width: u32) -> Result<RgbImage> {
    let img = ImageReader::open(path)
        .map_err(|e| BrainError::ImageLoad(path.to_path_buf(), e.to_string()))?
        .with_guessed_format()
        .map_err(|e| BrainError::ImageLoad(path.to_path_buf(), e.to_string()))?
        .decode()
        .map_err(|e| BrainError::ImageLoad(path.to_path_buf(), e.to_string()))?;

    Ok(img.resize_exact(width, height, FilterType::Triangle).to_rgb8())
}

/// Statistics about a loaded directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_samples: usize,
    /// (class name, count) in label order
    pub class_counts: Vec<(String, usize)>,
}

impl fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Total samples: {}", self.total_samples)?;
        for (idx, (name, count)) in self.class_counts.iter().enumerate() {
            let bar_len = if self.total_samples > 0 {
                (*count as f32 / self.total_samples as f32 * 30.0) as usize
            } else {
                0
            };
            writeln!(f, "    {:3}. {:24} {:5} {}", idx, name, count, "█".repeat(bar_len))?;
        }
        Ok(())
    }
}

/// The processed train/test/valid datasets of one organized dataset folder
pub struct DatasetSplits {
    pub name: String,
    pub train: ProcessedDataset,
    pub test: ProcessedDataset,
    pub valid: Option<ProcessedDataset>,
}

impl DatasetSplits {
    /// Present splits in TRAIN, TEST, VALID order
    pub fn named(&self) -> Vec<(&'static str, &ProcessedDataset)> {
        let mut splits = vec![("TRAIN", &self.train), ("TEST", &self.test)];
        if let Some(valid) = &self.valid {
            splits.push(("VALID", valid));
        }
        splits
    }
}

/// Load `<base>/<name>/{train,test,valid}` through the preprocessing pipeline.
///
/// Training data is augmented, test and valid are not.
pub fn load_splits(base: impl AsRef<Path>, name: &str, config: &LoaderConfig) -> Result<DatasetSplits> {
    let root = base.as_ref().join(name);
    let train_dir = root.join("train");
    let test_dir = root.join("test");
    let valid_dir = root.join("valid");

    if !train_dir.is_dir() || !test_dir.is_dir() {
        return Err(BrainError::SplitsNotDetected(root));
    }

    let train = Pipeline::new(PipelineMode::Augment, config).process(DirectoryDataset::open(&train_dir, config)?);
    let test = Pipeline::new(PipelineMode::Plain, config).process(DirectoryDataset::open(&test_dir, config)?);
    let valid = if valid_dir.is_dir() {
        Some(Pipeline::new(PipelineMode::Plain, config).process(DirectoryDataset::open(&valid_dir, config)?))
    } else {
        None
    };

    info!(
        "Loaded splits for '{}': train {}, test {}, valid {}",
        name,
        train.len(),
        test.len(),
        valid.as_ref().map_or(0, ProcessedDataset::len)
    );

    Ok(DatasetSplits {
        name: name.to_string(),
        train,
        test,
        valid,
    })
}

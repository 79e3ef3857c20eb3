//! Application configuration
//!
//! One TOML file drives the CLI and the web server. Every field has a
//! default, so an empty file (or no file at all) is a valid configuration.
//!
//! ```toml
//! [data]
//! base_dir = "data"
//! split_seed = 43
//!
//! [inference]
//! image_size = 124
//!
//! [models.brain_stroke]
//! kind = "lstm"
//! path = "models/stroke"
//! num_outputs = 1
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dataset::loader::LoaderConfig;
use crate::dataset::split::SplitRatios;
use crate::model::ModelSpec;
use crate::types::TestType;
use crate::utils::error::{BrainError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub inference: InferenceConfig,
    pub models: ModelsConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Read and parse a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| BrainError::Config(format!("Failed to read config {}: {}", path.display(), e)))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| BrainError::Config(format!("Failed to parse config {}: {}", path.display(), e)))?;

        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.data.split_ratios().validate()?;

        if self.data.batch_size == 0 {
            return Err(BrainError::Config("data.batch_size must be greater than 0".into()));
        }
        if self.data.prefetch == 0 {
            return Err(BrainError::Config("data.prefetch must be greater than 0".into()));
        }
        if self.inference.image_size == 0 {
            return Err(BrainError::Config("inference.image_size must be greater than 0".into()));
        }

        for test_type in TestType::ALL {
            self.models
                .get(test_type)
                .validate()
                .map_err(|e| BrainError::Config(format!("models.{}: {}", test_type.slug(), e)))?;
        }

        Ok(())
    }

    /// Warn about models whose declared input size differs from the inference resize
    pub fn warn_on_size_mismatch(&self) {
        for test_type in TestType::ALL {
            let spec = self.models.get(test_type);
            if spec.input_size != self.inference.image_size {
                warn!(
                    "Model for {} declares input size {} but scans are resized to {}x{}",
                    test_type, spec.input_size, self.inference.image_size, self.inference.image_size
                );
            }
        }
    }
}

/// Dataset organizing and preprocessing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding one folder per dataset
    pub base_dir: PathBuf,
    /// Seed for both train/test splits
    pub split_seed: u64,
    pub first_test_fraction: f64,
    pub second_test_fraction: f64,
    /// Seed for shuffling loaded samples
    pub loader_seed: u64,
    pub image_size: usize,
    pub batch_size: usize,
    /// Batches buffered ahead of the consumer
    pub prefetch: usize,
    /// Burn data loader threads used by `evaluate`
    pub num_workers: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        let ratios = SplitRatios::default();
        let loader = LoaderConfig::default();
        Self {
            base_dir: PathBuf::from("data"),
            split_seed: ratios.seed,
            first_test_fraction: ratios.first_test_fraction,
            second_test_fraction: ratios.second_test_fraction,
            loader_seed: loader.seed,
            image_size: loader.image_size.0,
            batch_size: loader.batch_size,
            prefetch: loader.prefetch,
            num_workers: 2,
        }
    }
}

impl DataConfig {
    pub fn split_ratios(&self) -> SplitRatios {
        SplitRatios {
            first_test_fraction: self.first_test_fraction,
            second_test_fraction: self.second_test_fraction,
            seed: self.split_seed,
        }
    }

    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            image_size: (self.image_size, self.image_size),
            batch_size: self.batch_size,
            shuffle: true,
            seed: self.loader_seed,
            prefetch: self.prefetch,
        }
    }
}

/// How uploaded scans are prepared for the models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Square size scans are resized to
    pub image_size: usize,
    /// Divide pixel values by 255 before the forward pass
    pub rescale: bool,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            image_size: crate::INFERENCE_IMAGE_SIZE,
            rescale: false,
        }
    }
}

/// One model per test type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub alzheimer: ModelSpec,
    pub brain_stroke: ModelSpec,
    pub tumor: ModelSpec,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            alzheimer: ModelSpec::cnn("models/alzheimer"),
            brain_stroke: ModelSpec::cnn("models/stroke"),
            tumor: ModelSpec::cnn("models/tumor"),
        }
    }
}

impl ModelsConfig {
    pub fn get(&self, test_type: TestType) -> &ModelSpec {
        match test_type {
            TestType::Alzheimers => &self.alzheimer,
            TestType::BrainStroke => &self.brain_stroke,
            TestType::Tumor => &self.tumor,
        }
    }
}

/// Web front-end settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on an uploaded request body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

//! Model module: network architectures and record loading
//!
//! This module provides:
//! - `BrainCnn`, a convolutional classifier
//! - `BrainLstm`, a recurrent classifier that reads image rows as a sequence
//! - `ModelSpec`, the configuration entry that ties a record file to its architecture
//!
//! Weights are stored with Burn's `CompactRecorder`. Training is not part of
//! this crate; `ScanNet::save` only writes freshly initialised weights.

pub mod cnn;
pub mod config;
pub mod lstm;

use std::path::{Path, PathBuf};

use burn::{
    module::Module,
    record::CompactRecorder,
    tensor::{activation, backend::Backend, Tensor},
};
use tracing::{debug, info};

pub use cnn::{BrainCnn, BrainCnnConfig};
pub use config::{ModelKind, ModelSpec};
pub use lstm::{BrainLstm, BrainLstmConfig};

use crate::utils::error::{BrainError, Result};

/// Sigmoid for a single output unit, softmax over the outputs otherwise
pub(crate) fn output_activation<B: Backend>(logits: Tensor<B, 2>, num_outputs: usize) -> Tensor<B, 2> {
    if num_outputs == 1 {
        activation::sigmoid(logits)
    } else {
        activation::softmax(logits, 1)
    }
}

/// Either architecture behind one forward interface
#[derive(Debug, Clone)]
pub enum ScanNet<B: Backend> {
    Cnn(BrainCnn<B>),
    Lstm(BrainLstm<B>),
}

impl<B: Backend> ScanNet<B> {
    /// Freshly initialised network matching `spec`
    pub fn init(spec: &ModelSpec, device: &B::Device) -> Self {
        match spec.kind {
            ModelKind::Cnn => {
                let config = BrainCnnConfig::new().with_num_outputs(spec.num_outputs);
                ScanNet::Cnn(BrainCnn::new(&config, device))
            }
            ModelKind::Lstm => {
                let config = BrainLstmConfig::new()
                    .with_input_size(spec.input_size)
                    .with_num_outputs(spec.num_outputs);
                ScanNet::Lstm(BrainLstm::new(&config, device))
            }
        }
    }

    /// Activated scores for an NHWC batch
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        match self {
            ScanNet::Cnn(model) => model.forward(x),
            ScanNet::Lstm(model) => model.forward(x),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            ScanNet::Cnn(_) => ModelKind::Cnn,
            ScanNet::Lstm(_) => ModelKind::Lstm,
        }
    }

    pub fn num_outputs(&self) -> usize {
        match self {
            ScanNet::Cnn(model) => model.num_outputs(),
            ScanNet::Lstm(model) => model.num_outputs(),
        }
    }

    /// Write the weights to `path` (the recorder appends `.mpk`)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let recorder = CompactRecorder::new();
        let result = match self {
            ScanNet::Cnn(model) => model.clone().save_file(path, &recorder),
            ScanNet::Lstm(model) => model.clone().save_file(path, &recorder),
        };

        result.map_err(|e| BrainError::Model(format!("Failed to save model to {:?}: {:?}", path, e)))
    }
}

/// Resolve the on-disk record for a spec path.
///
/// `CompactRecorder` appends `.mpk`, so both `models/tumor` and
/// `models/tumor.mpk` are accepted in configuration. `Ok(None)` means no
/// record exists yet; a file at `path` that is not a `.mpk` record is an error.
pub fn record_path(path: &Path) -> Result<Option<PathBuf>> {
    let with_ext = path.with_extension("mpk");
    if with_ext.is_file() {
        Ok(Some(path.with_extension("")))
    } else if path.exists() {
        Err(BrainError::Model(format!(
            "{:?} is not a model record; expected a CompactRecorder file at {:?}",
            path, with_ext
        )))
    } else {
        Ok(None)
    }
}

/// Load a pre-trained network described by `spec`
pub fn load_model<B: Backend>(spec: &ModelSpec, device: &B::Device) -> Result<ScanNet<B>> {
    spec.validate().map_err(BrainError::Config)?;

    let path = record_path(&spec.path)?.ok_or_else(|| {
        BrainError::Model(format!("Model file not found: {:?} (or {:?})", spec.path, spec.path.with_extension("mpk")))
    })?;

    debug!("Loading {} record from {:?}", spec.kind, path);
    let recorder = CompactRecorder::new();

    let net = match ScanNet::<B>::init(spec, device) {
        ScanNet::Cnn(model) => model
            .load_file(&path, &recorder, device)
            .map(ScanNet::Cnn),
        ScanNet::Lstm(model) => model
            .load_file(&path, &recorder, device)
            .map(ScanNet::Lstm),
    }
    .map_err(|e| BrainError::Model(format!("Failed to load model {:?}: {:?}", path, e)))?;

    info!("Loaded {} model from {:?}", net.kind(), path);
    Ok(net)
}

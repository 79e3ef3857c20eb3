//! Model Configuration Module
//!
//! Describes which architecture a saved record belongs to and where it lives.
//! A record written by Burn's `CompactRecorder` can only be loaded into the
//! exact module it was saved from, so the kind and output width travel with
//! the path.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Network architecture of a saved model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Convolutional classifier
    Cnn,
    /// Row-wise recurrent classifier (image rows as a sequence)
    Lstm,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Cnn => write!(f, "CNN"),
            ModelKind::Lstm => write!(f, "LSTM"),
        }
    }
}

/// A single pre-trained model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Architecture the record was saved from
    #[serde(default = "default_kind")]
    pub kind: ModelKind,

    /// Record path, without the `.mpk` extension the recorder appends
    pub path: PathBuf,

    /// Width of the output layer (1 = sigmoid head, 2+ = softmax head)
    #[serde(default = "default_num_outputs")]
    pub num_outputs: usize,

    /// Square input size the network was trained at
    #[serde(default = "default_input_size")]
    pub input_size: usize,
}

fn default_kind() -> ModelKind {
    ModelKind::Cnn
}

fn default_num_outputs() -> usize {
    2
}

fn default_input_size() -> usize {
    crate::TRAINING_IMAGE_SIZE
}

impl ModelSpec {
    /// CNN spec with default head and input size
    pub fn cnn(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ModelKind::Cnn,
            path: path.into(),
            num_outputs: default_num_outputs(),
            input_size: default_input_size(),
        }
    }

    /// LSTM spec with the single sigmoid output of the recurrent model
    pub fn lstm(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ModelKind::Lstm,
            path: path.into(),
            num_outputs: 1,
            input_size: default_input_size(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.num_outputs == 0 {
            return Err("num_outputs must be greater than 0".to_string());
        }
        if self.input_size == 0 {
            return Err("input_size must be greater than 0".to_string());
        }
        Ok(())
    }
}

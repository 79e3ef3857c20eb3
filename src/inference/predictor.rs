//! Inference Predictor Module
//!
//! Decodes an uploaded scan, runs it through a model and turns the scores
//! into a binary condition label.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use burn::tensor::{backend::Backend, Tensor, TensorData};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{ModelKind, ScanNet};
use crate::types::ConditionLabel;
use crate::utils::error::{BrainError, Result};

/// A single decoded scan with a batch dimension, NHWC
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub data: Vec<f32>,
    /// [1, height, width, 3]
    pub shape: [usize; 4],
}

/// Decode image bytes and resize exactly to `(height, width)`.
///
/// Pixel values stay in [0, 255] unless `rescale` is set.
pub fn load_scan(bytes: &[u8], size: (u32, u32), rescale: bool) -> Result<ImageTensor> {
    let (height, width) = size;
    if height == 0 || width == 0 {
        return Err(BrainError::InvalidInput("Scan size must be non-zero".to_string()));
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| BrainError::ImageLoad("<upload>".into(), e.to_string()))?
        .to_rgb8();
    let resized = image::imageops::resize(&img, width, height, FilterType::Triangle);

    let scale = if rescale { 1.0 / 255.0 } else { 1.0 };
    let data: Vec<f32> = resized.into_raw().into_iter().map(|v| v as f32 * scale).collect();

    Ok(ImageTensor {
        data,
        shape: [1, height as usize, width as usize, 3],
    })
}

/// How scores become a class index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    /// Index of the highest score
    ArgMax,
    /// Class 1 when the single score reaches the threshold
    Threshold(f32),
}

impl Decision {
    /// Threshold at 0.5 for a single sigmoid output, argmax otherwise
    pub fn for_outputs(num_outputs: usize) -> Self {
        if num_outputs == 1 {
            Decision::Threshold(0.5)
        } else {
            Decision::ArgMax
        }
    }

    pub fn class_index(&self, scores: &[f32]) -> Result<usize> {
        if scores.is_empty() {
            return Err(BrainError::Inference("Model returned no scores".to_string()));
        }

        match self {
            Decision::ArgMax => scores
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .map(|(i, _)| i)
                .ok_or_else(|| BrainError::Inference("Model returned no scores".to_string())),
            Decision::Threshold(threshold) => Ok(usize::from(scores[0] >= *threshold)),
        }
    }
}

/// Result of a single prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: ConditionLabel,
    pub class_index: usize,
    /// Activated scores as returned by the model
    pub scores: Vec<f32>,
    /// Inference time in milliseconds
    pub inference_time_ms: f64,
}

impl Prediction {
    pub fn new(scores: Vec<f32>, decision: Decision, inference_time: Duration) -> Result<Self> {
        let class_index = decision.class_index(&scores)?;
        Ok(Self {
            label: ConditionLabel::from_class_index(class_index),
            class_index,
            scores,
            inference_time_ms: inference_time.as_secs_f64() * 1000.0,
        })
    }
}

/// A loaded model that scores one scan
pub trait ScanModel: Send + Sync {
    /// Activated scores for a single image
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>>;

    fn num_outputs(&self) -> usize;

    fn describe(&self) -> String {
        format!("{}-output model", self.num_outputs())
    }
}

/// `ScanModel` backed by a Burn network
pub struct BurnScanModel<B: Backend> {
    net: Mutex<ScanNet<B>>,
    device: B::Device,
    /// Row width the recurrent network was built for
    input_size: usize,
}

impl<B: Backend> BurnScanModel<B> {
    pub fn new(net: ScanNet<B>, device: B::Device, input_size: usize) -> Self {
        Self {
            net: Mutex::new(net),
            device,
            input_size,
        }
    }
}

impl<B: Backend> ScanModel for BurnScanModel<B> {
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>> {
        let net = self
            .net
            .lock()
            .map_err(|_| BrainError::Inference("Model lock poisoned".to_string()))?;

        let [_, height, width, _] = input.shape;
        if net.kind() == ModelKind::Lstm && width != self.input_size {
            return Err(BrainError::Inference(format!(
                "LSTM model expects {}-pixel rows, got a {}x{} scan",
                self.input_size, height, width
            )));
        }

        let tensor = Tensor::<B, 4>::from_floats(TensorData::new(input.data.clone(), input.shape), &self.device);
        let output = net.forward(tensor);

        output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| BrainError::Inference(format!("Failed to read model output: {:?}", e)))
    }

    fn num_outputs(&self) -> usize {
        self.net.lock().map(|net| net.num_outputs()).unwrap_or(0)
    }

    fn describe(&self) -> String {
        match self.net.lock() {
            Ok(net) => format!("{} ({} outputs)", net.kind(), net.num_outputs()),
            Err(_) => "unavailable".to_string(),
        }
    }
}

/// Runs a model on a scan and applies the decision rule
#[derive(Debug, Clone, Copy, Default)]
pub struct Predictor {
    /// Fixed rule; derived from the output width when `None`
    pub decision: Option<Decision>,
}

impl Predictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decision(decision: Decision) -> Self {
        Self {
            decision: Some(decision),
        }
    }

    pub fn predict(&self, model: &dyn ScanModel, input: &ImageTensor) -> Result<Prediction> {
        if input.shape[0] != 1 {
            return Err(BrainError::InvalidInput(format!(
                "Expected a single scan, got a batch of {}",
                input.shape[0]
            )));
        }

        let start = Instant::now();
        let scores = model.infer(input)?;
        let elapsed = start.elapsed();

        let decision = self.decision.unwrap_or_else(|| Decision::for_outputs(scores.len()));
        let prediction = Prediction::new(scores, decision, elapsed)?;

        debug!(
            "Prediction {} (scores {:?}) in {:.2} ms",
            prediction.label, prediction.scores, prediction.inference_time_ms
        );
        Ok(prediction)
    }
}
